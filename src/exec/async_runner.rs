// src/exec/async_runner.rs

//! Asynchronous execution path.
//!
//! `run_async` spawns a short-lived dispatch thread that submits a streaming
//! job to the worker and waits for it (bounded). Output lines are posted to
//! the UI loop by the worker as they are read; the terminal outcome is posted
//! by the dispatch thread afterwards. Since both go through the same FIFO UI
//! queue, every `on_data` runs before the terminal callback and no two
//! callbacks of one invocation ever overlap.
//!
//! After a timeout the job can still be running on the worker and reading
//! output. The terminal task closes a per-invocation gate when it runs on the
//! UI loop, and every data task checks that gate on the UI loop too, so a
//! line that is posted after the terminal callback is dropped.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, trace, warn};

use crate::errors::ExecError;
use crate::exec::job::Job;
use crate::exec::service::ExecutionService;
use crate::exec::task_runner::run_streaming;
use crate::ui::UiDispatcher;

type DataFn = Arc<dyn Fn(String) + Send + Sync + 'static>;
type ExitFn = Box<dyn FnOnce(i32) + Send + 'static>;
type ExceptionFn = Box<dyn FnOnce(ExecError) + Send + 'static>;

/// Callbacks for one asynchronous invocation. All of them run on the UI loop.
///
/// Exactly one of `on_complete` (exit code 0), `on_error` (non-zero exit
/// code) or `on_exception` (timeout or worker-side failure) fires per
/// invocation; `on_data` fires once per output line before that.
#[derive(Default)]
pub struct AsyncCallbacks {
    on_data: Option<DataFn>,
    on_complete: Option<ExitFn>,
    on_error: Option<ExitFn>,
    on_exception: Option<ExceptionFn>,
}

impl fmt::Debug for AsyncCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncCallbacks")
            .field("on_data", &self.on_data.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_exception", &self.on_exception.is_some())
            .finish()
    }
}

impl AsyncCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_data(mut self, f: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_data = Some(Arc::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce(i32) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(i32) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_exception(mut self, f: impl FnOnce(ExecError) + Send + 'static) -> Self {
        self.on_exception = Some(Box::new(f));
        self
    }
}

/// Handle to a running asynchronous invocation (its dispatch thread).
#[derive(Debug)]
pub struct AsyncHandle {
    thread: JoinHandle<()>,
}

impl AsyncHandle {
    /// True once the terminal callback has been posted.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Block until the dispatch thread is done. Callbacks may still be
    /// sitting in the UI queue afterwards.
    pub fn join(self) -> Result<(), ExecError> {
        self.thread
            .join()
            .map_err(|_| ExecError::failure("async dispatch thread panicked"))
    }
}

impl ExecutionService {
    /// Run `job` on the worker, streaming its output to `callbacks` via `ui`.
    pub fn run_async(
        &self,
        job: Job,
        ui: Arc<dyn UiDispatcher>,
        callbacks: AsyncCallbacks,
    ) -> Result<AsyncHandle, ExecError> {
        let service = self.clone();

        let thread = thread::Builder::new()
            .name("vcs-runner-dispatch".to_string())
            .spawn(move || dispatch(service, job, ui, callbacks))
            .map_err(|e| ExecError::failure(format!("starting dispatch thread: {e}")))?;

        Ok(AsyncHandle { thread })
    }
}

fn dispatch(service: ExecutionService, job: Job, ui: Arc<dyn UiDispatcher>, callbacks: AsyncCallbacks) {
    let AsyncCallbacks {
        on_data,
        on_complete,
        on_error,
        on_exception,
    } = callbacks;

    let argv = job.argv.clone();
    let closed = Arc::new(AtomicBool::new(false));

    let line_ui = Arc::clone(&ui);
    let line_gate = Arc::clone(&closed);
    let on_line = move |line: String| {
        let Some(on_data) = &on_data else { return };
        if line_gate.load(Ordering::Acquire) {
            trace!("terminal callback already ran; dropping line");
            return;
        }
        let on_data = Arc::clone(on_data);
        let gate = Arc::clone(&line_gate);
        line_ui.post(Box::new(move || {
            if !gate.load(Ordering::Acquire) {
                on_data(line);
            }
        }));
    };

    let timeout = service.options().async_result_timeout;
    let outcome = service.execute_with_timeout(move || run_streaming(job, on_line), timeout);

    let terminal: Option<Box<dyn FnOnce() + Send>> = match outcome {
        Ok(0) => {
            debug!(?argv, "async command completed");
            on_complete.map(|f| Box::new(move || f(0)) as Box<dyn FnOnce() + Send>)
        }
        Ok(code) => {
            debug!(?argv, exit_code = code, "async command exited with error");
            on_error.map(|f| Box::new(move || f(code)) as Box<dyn FnOnce() + Send>)
        }
        Err(err) => {
            warn!(?argv, error = %err, "async-exception");
            on_exception.map(|f| Box::new(move || f(err)) as Box<dyn FnOnce() + Send>)
        }
    };

    ui.post(Box::new(move || {
        closed.store(true, Ordering::Release);
        if let Some(callback) = terminal {
            callback();
        }
    }));
}
