// tests/async_execution.rs

use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use vcs_runner::errors::ExecErrorKind;
use vcs_runner::exec::{ExecutionService, Job, QueueOptions};
use vcs_runner::ui::{self, UiDispatcher};
use vcs_runner_test_utils::builders::queue_options;
use vcs_runner_test_utils::recording::{CallbackEvent, Recorder};
use vcs_runner_test_utils::{init_tracing, sh, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn streams_lines_in_order_then_completes_once() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(QueueOptions::default())?;
    let (ui, mut ui_loop) = ui::channel();
    let recorder = Recorder::new();

    let handle = service.run_async(
        Job::new(sh("echo one; echo two; echo three")),
        Arc::new(ui),
        recorder.callbacks(),
    )?;
    handle.join()?;

    // Nothing runs until the UI loop is pumped.
    assert!(recorder.events().is_empty());
    ui_loop.run_pending();

    assert_eq!(
        recorder.events(),
        vec![
            CallbackEvent::Data("one".to_string()),
            CallbackEvent::Data("two".to_string()),
            CallbackEvent::Data("three".to_string()),
            CallbackEvent::Complete(0),
        ]
    );
    Ok(())
}

#[test]
fn nonzero_exit_reports_on_error_only() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(QueueOptions::default())?;
    let (ui, mut ui_loop) = ui::channel();
    let recorder = Recorder::new();

    let handle = service.run_async(
        Job::new(sh("echo oops >&2; exit 1")),
        Arc::new(ui),
        recorder.callbacks(),
    )?;
    handle.join()?;
    ui_loop.run_pending();

    // stderr is merged into the streamed output.
    assert_eq!(
        recorder.events(),
        vec![CallbackEvent::Data("oops".to_string()), CallbackEvent::Error(1)]
    );
    Ok(())
}

#[test]
fn spawn_failure_reports_on_exception() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(QueueOptions::default())?;
    let (ui, mut ui_loop) = ui::channel();
    let recorder = Recorder::new();

    let handle = service.run_async(
        Job::new(["vcs-runner-no-such-binary", "fetch"]),
        Arc::new(ui),
        recorder.callbacks(),
    )?;
    handle.join()?;
    ui_loop.run_pending();

    assert_eq!(
        recorder.events(),
        vec![CallbackEvent::Exception(ExecErrorKind::Spawn)]
    );
    Ok(())
}

#[test]
fn bounded_wait_expiry_reports_on_exception() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(queue_options(
        Duration::from_secs(5),
        Duration::from_millis(200),
    ))?;
    let (ui, mut ui_loop) = ui::channel();
    let recorder = Recorder::new();

    let handle = service.run_async(Job::new(sh("sleep 2")), Arc::new(ui), recorder.callbacks())?;
    handle.join()?;
    ui_loop.run_pending();

    assert_eq!(
        recorder.events(),
        vec![CallbackEvent::Exception(ExecErrorKind::Timeout)]
    );
    Ok(())
}

#[test]
fn lines_read_after_a_timeout_are_not_delivered() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(queue_options(
        Duration::from_secs(5),
        Duration::from_millis(200),
    ))?;
    let (ui, mut ui_loop) = ui::channel();
    let recorder = Recorder::new();

    let handle = service.run_async(
        Job::new(sh("sleep 0.5; echo late")),
        Arc::new(ui),
        recorder.callbacks(),
    )?;

    // Outlive the process so its line has been read and posted.
    thread::sleep(Duration::from_millis(800));
    assert!(handle.is_finished());
    handle.join()?;
    ui_loop.run_pending();

    assert_eq!(
        recorder.events(),
        vec![CallbackEvent::Exception(ExecErrorKind::Timeout)]
    );
    Ok(())
}

#[test]
fn callbacks_run_on_the_thread_that_drains_the_ui_loop() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(QueueOptions::default())?;
    let (ui, mut ui_loop) = ui::channel();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

    let callbacks = {
        let data = Arc::clone(&seen);
        let done = Arc::clone(&seen);
        vcs_runner::exec::AsyncCallbacks::new()
            .on_data(move |_| data.lock().unwrap().push(thread::current().id()))
            .on_complete(move |_| done.lock().unwrap().push(thread::current().id()))
    };

    let handle = service.run_async(Job::new(sh("echo a; echo b")), Arc::new(ui), callbacks)?;
    handle.join()?;
    ui_loop.run_pending();

    let me = thread::current().id();
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|id| *id == me));
    Ok(())
}

#[tokio::test]
async fn ui_loop_drives_callbacks_until_terminal_event() -> TestResult {
    init_tracing();
    let service = ExecutionService::start(QueueOptions::default())?;
    let (ui, mut ui_loop) = ui::channel();
    let dispatcher: Arc<dyn UiDispatcher> = Arc::new(ui);
    let recorder = Recorder::new();

    let _handle = service.run_async(
        Job::new(sh("printf 'x\\ny\\n'")),
        Arc::clone(&dispatcher),
        recorder.callbacks(),
    )?;

    let watcher = recorder.clone();
    with_timeout(ui_loop.run_while(move || !watcher.finished())).await;

    assert_eq!(
        recorder.events(),
        vec![
            CallbackEvent::Data("x".to_string()),
            CallbackEvent::Data("y".to_string()),
            CallbackEvent::Complete(0),
        ]
    );
    Ok(())
}
