// tests/sync_execution.rs

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use vcs_runner::errors::{ExecError, ExecErrorKind};
use vcs_runner::exec::{ExecutionService, Job, QueueOptions};
use vcs_runner::types::HandoffStage;
use vcs_runner_test_utils::builders::queue_options;
use vcs_runner_test_utils::{init_tracing, sh};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn sync_job_returns_exit_code_and_both_streams() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(QueueOptions::default())?;

    let output = service.run_sync(Job::new(sh("echo out; echo err >&2; exit 3")))?;

    assert_eq!(output.exit_code, 3);
    assert_eq!(output.stdout, "out\n");
    assert_eq!(output.stderr, "err\n");
    assert!(!output.success());
    Ok(())
}

#[test]
fn concurrent_callers_each_get_their_own_result_exactly_once() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(QueueOptions::default())?;

    let handles: Vec<_> = (0..6)
        .map(|caller| {
            let service = service.clone();
            thread::spawn(move || {
                (0..4)
                    .map(|n| {
                        let tag = format!("{caller}-{n}");
                        let out = service
                            .run_sync(Job::new(sh(&format!("echo {tag}"))))
                            .expect("job should succeed");
                        (tag, out.stdout)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut delivered = 0;
    for handle in handles {
        for (tag, stdout) in handle.join().expect("caller thread panicked") {
            assert_eq!(stdout.trim(), tag);
            delivered += 1;
        }
    }
    assert_eq!(delivered, 24);
    Ok(())
}

#[test]
fn reentrant_submit_from_worker_runs_inline() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(QueueOptions::default())?;
    let inner = service.clone();

    let (on_worker, output) = service.execute(move || {
        let on_worker = inner.is_worker_thread();
        let output = inner.run_sync(Job::new(sh("echo inner")))?;
        Ok((on_worker, output))
    })?;

    assert!(on_worker);
    assert!(!service.is_worker_thread());
    assert_eq!(output.stdout, "inner\n");
    Ok(())
}

#[test]
fn concurrent_jobs_never_overlap() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(QueueOptions::default())?;
    let spans: Arc<Mutex<Vec<(Instant, Instant)>>> = Arc::new(Mutex::new(Vec::new()));

    let started = Instant::now();
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = service.clone();
            let spans = Arc::clone(&spans);
            thread::spawn(move || {
                service.execute(move || {
                    let begin = Instant::now();
                    let out = vcs_runner::exec::task_runner::run_captured(Job::new(sh("sleep 0.3")))?;
                    spans.lock().unwrap().push((begin, Instant::now()));
                    Ok(out)
                })
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("caller thread panicked")?;
    }
    let elapsed = started.elapsed();

    assert!(
        elapsed >= Duration::from_millis(600),
        "two 300ms jobs finished in {elapsed:?}; they must have overlapped"
    );

    let mut spans = spans.lock().unwrap().clone();
    spans.sort();
    assert_eq!(spans.len(), 2);
    assert!(spans[0].1 <= spans[1].0, "job executions overlapped: {spans:?}");
    Ok(())
}

#[test]
fn result_wait_times_out_while_worker_is_stuck() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(queue_options(
        Duration::from_secs(5),
        Duration::from_millis(300),
    ))?;

    // Occupy the worker with a process that outlives every bound below.
    let blocker = {
        let service = service.clone();
        thread::spawn(move || service.run_sync(Job::new(sh("sleep 3"))))
    };
    thread::sleep(Duration::from_millis(100));

    let started = Instant::now();
    let result = service.run_sync(Job::new(sh("echo never")));
    let elapsed = started.elapsed();

    match result {
        Err(ExecError::Timeout { stage, after }) => {
            assert_eq!(stage, HandoffStage::Result);
            assert_eq!(after, Duration::from_millis(300));
        }
        other => panic!("expected result timeout, got {other:?}"),
    }
    assert!(elapsed >= Duration::from_millis(250), "timed out too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "timed out too late: {elapsed:?}");

    let blocked = blocker.join().expect("blocker thread panicked");
    assert!(matches!(blocked, Err(ExecError::Timeout { .. })));
    Ok(())
}

#[test]
fn submit_times_out_when_the_slot_stays_full() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(queue_options(
        Duration::from_millis(200),
        Duration::from_secs(5),
    ))?;

    // First job runs on the worker, second one sits in the slot.
    let running = {
        let service = service.clone();
        thread::spawn(move || service.run_sync(Job::new(sh("sleep 2"))))
    };
    thread::sleep(Duration::from_millis(100));
    let queued = {
        let service = service.clone();
        thread::spawn(move || service.run_sync(Job::new(sh("echo queued"))))
    };
    thread::sleep(Duration::from_millis(100));

    let started = Instant::now();
    let result = service.run_sync(Job::new(sh("echo third")));
    let elapsed = started.elapsed();

    match result {
        Err(ExecError::Timeout { stage, .. }) => assert_eq!(stage, HandoffStage::Submit),
        other => panic!("expected submit timeout, got {other:?}"),
    }
    assert!(elapsed >= Duration::from_millis(150), "timed out too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(1), "timed out too late: {elapsed:?}");

    assert_eq!(running.join().expect("thread panicked")?.exit_code, 0);
    assert_eq!(queued.join().expect("thread panicked")?.stdout, "queued\n");
    Ok(())
}

#[test]
fn worker_survives_a_panicking_job() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(QueueOptions::default())?;

    let failed = service.execute(|| -> Result<(), ExecError> { panic!("boom in job") });
    match failed {
        Err(ExecError::Failure { message }) => assert!(message.contains("boom in job")),
        other => panic!("expected execution failure, got {other:?}"),
    }

    let output = service.run_sync(Job::new(sh("echo still alive")))?;
    assert_eq!(output.stdout, "still alive\n");
    Ok(())
}

#[test]
fn missing_executable_is_a_spawn_error() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(QueueOptions::default())?;

    let err = service
        .run_sync(Job::new(["vcs-runner-no-such-binary", "status"]))
        .expect_err("spawn should fail");
    assert_eq!(err.kind(), ExecErrorKind::Spawn);

    let ignored = service.run_sync(Job::new(["vcs-runner-no-such-binary"]).ignore_errors(true))?;
    assert_eq!(ignored.exit_code, 0);
    assert!(ignored.stdout.is_empty() && ignored.stderr.is_empty());
    Ok(())
}

#[test]
fn stdin_is_piped_and_cwd_is_applied_per_job() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(QueueOptions::default())?;
    let dir = tempfile::tempdir()?;
    let before = std::env::current_dir()?;

    let echoed = service.run_sync(Job::new(sh("cat")).stdin(b"hello from stdin".to_vec()))?;
    assert_eq!(echoed.stdout, "hello from stdin");

    let pwd = service.run_sync(Job::new(sh("pwd")).cwd(dir.path()))?;
    let name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
    assert!(pwd.stdout.trim_end().ends_with(&name), "pwd was {:?}", pwd.stdout);

    assert_eq!(std::env::current_dir()?, before);
    Ok(())
}

#[test]
fn env_overrides_reach_the_child() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(QueueOptions::default())?;

    let output = service.run_sync(
        Job::new(sh("echo \"$VCS_RUNNER_TEST_VAR\""))
            .env_var("VCS_RUNNER_TEST_VAR", "from the job"),
    )?;
    assert_eq!(output.stdout, "from the job\n");

    let unset = service.run_sync(Job::new(sh("echo \"[$VCS_RUNNER_TEST_VAR]\"")))?;
    assert_eq!(unset.stdout, "[]\n");
    Ok(())
}

#[test]
fn output_decodes_through_fallback_encodings() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(QueueOptions::default())?;

    // 0xE9 is 'é' in latin-1 and an invalid lone byte in UTF-8.
    let decoded = service.run_sync(
        Job::new(sh(r"printf 'caf\351'")).fallback_encodings(["latin-1"]),
    )?;
    assert_eq!(decoded.stdout, "café");

    let err = service
        .run_sync(Job::new(sh(r"printf 'caf\351'")))
        .expect_err("utf-8 alone cannot decode");
    match err {
        ExecError::Decoding(e) => assert_eq!(e.attempted, vec!["utf-8".to_string()]),
        other => panic!("expected decoding error, got {other:?}"),
    }

    let ignored = service.run_sync(Job::new(sh(r"printf 'caf\351'")).ignore_errors(true))?;
    assert_eq!(ignored.stdout, "");
    Ok(())
}
