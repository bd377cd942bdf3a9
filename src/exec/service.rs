// src/exec/service.rs

//! The execution service: job slot, worker thread, and the synchronous path.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, ThreadId};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, SendTimeoutError, Sender};
use tracing::{debug, info, warn};

use crate::errors::ExecError;
use crate::exec::executor_loop::{Envelope, spawn_worker};
use crate::exec::job::{CommandOutput, Job};
use crate::exec::task_runner::run_captured;
use crate::types::HandoffStage;

/// Bounds for every hand-off across the job queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueOptions {
    /// How long a caller waits for the job slot to accept its submission.
    pub submit_timeout: Duration,
    /// How long a synchronous caller waits for its result.
    pub result_timeout: Duration,
    /// How long an async dispatch thread waits for its streamed job.
    pub async_result_timeout: Duration,
    /// How long the worker blocks on an empty slot before polling again.
    pub worker_poll_interval: Duration,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            submit_timeout: Duration::from_secs(10),
            result_timeout: Duration::from_secs(10),
            async_result_timeout: Duration::from_secs(10),
            worker_poll_interval: Duration::from_secs(1),
        }
    }
}

/// Handle to the single-worker job queue.
///
/// Cheap to clone; all clones share one worker thread and one job slot, so
/// external processes started through any of them never overlap. The worker
/// exits once the last handle is dropped.
///
/// A call made *from* the worker thread (a job that itself runs a command)
/// is executed in-line instead of being queued, since queueing onto the
/// thread that would have to drain the queue can only deadlock.
#[derive(Clone)]
pub struct ExecutionService {
    inner: Arc<Inner>,
}

struct Inner {
    jobs: Sender<Envelope>,
    worker_id: ThreadId,
    options: QueueOptions,
    next_id: AtomicU64,
}

impl fmt::Debug for ExecutionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionService")
            .field("worker_id", &self.inner.worker_id)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl ExecutionService {
    /// Create the job slot and start the worker thread.
    pub fn start(options: QueueOptions) -> std::io::Result<Self> {
        let (jobs_tx, jobs_rx) = crossbeam_channel::bounded::<Envelope>(1);
        let worker = spawn_worker(jobs_rx, options.worker_poll_interval)?;
        let worker_id = worker.thread().id();

        info!(?options, "execution service started");

        Ok(Self {
            inner: Arc::new(Inner {
                jobs: jobs_tx,
                worker_id,
                options,
                next_id: AtomicU64::new(1),
            }),
        })
    }

    pub fn options(&self) -> &QueueOptions {
        &self.inner.options
    }

    /// Whether the current thread is this service's worker.
    pub fn is_worker_thread(&self) -> bool {
        thread::current().id() == self.inner.worker_id
    }

    /// Run `job` on the worker and wait for its captured output.
    pub fn run_sync(&self, job: Job) -> Result<CommandOutput, ExecError> {
        self.execute(move || run_captured(job))
    }

    /// Run an arbitrary job body on the worker thread and wait for its result,
    /// bounded by [`QueueOptions::result_timeout`].
    pub fn execute<T, F>(&self, work: F) -> Result<T, ExecError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, ExecError> + Send + 'static,
    {
        self.execute_with_timeout(work, self.inner.options.result_timeout)
    }

    pub(crate) fn execute_with_timeout<T, F>(
        &self,
        work: F,
        result_timeout: Duration,
    ) -> Result<T, ExecError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, ExecError> + Send + 'static,
    {
        if self.is_worker_thread() {
            debug!("already on the worker thread; executing in-line");
            return run_guarded(work);
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = crossbeam_channel::bounded::<Result<T, ExecError>>(1);
        let abandoned = Arc::new(AtomicBool::new(false));

        let envelope = Envelope {
            id,
            abandoned: Arc::clone(&abandoned),
            run: Box::new(move || {
                let result = run_guarded(work);
                if reply_tx.try_send(result).is_err() {
                    debug!(job = id, "caller no longer waiting; dropping result");
                }
            }),
        };

        let submit_timeout = self.inner.options.submit_timeout;
        self.inner
            .jobs
            .send_timeout(envelope, submit_timeout)
            .map_err(|err| match err {
                SendTimeoutError::Timeout(_) => {
                    warn!(job = id, after = ?submit_timeout, "job slot still occupied; giving up");
                    ExecError::Timeout {
                        stage: HandoffStage::Submit,
                        after: submit_timeout,
                    }
                }
                SendTimeoutError::Disconnected(_) => {
                    ExecError::failure("worker thread is no longer running")
                }
            })?;

        match reply_rx.recv_timeout(result_timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                abandoned.store(true, Ordering::SeqCst);
                warn!(job = id, after = ?result_timeout, "no result in time; the process may still be running");
                Err(ExecError::Timeout {
                    stage: HandoffStage::Result,
                    after: result_timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(ExecError::failure("worker dropped the job without a result"))
            }
        }
    }
}

/// Run a job body, turning a panic into [`ExecError::Failure`].
fn run_guarded<T, F>(work: F) -> Result<T, ExecError>
where
    F: FnOnce() -> Result<T, ExecError>,
{
    panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        warn!(%message, "job panicked; reporting failure");
        Err(ExecError::Failure { message })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_string()
    }
}
