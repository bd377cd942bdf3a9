use std::sync::{Arc, Mutex};

use vcs_runner::errors::ExecErrorKind;
use vcs_runner::exec::AsyncCallbacks;

/// One callback invocation, as observed on the UI loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackEvent {
    Data(String),
    Complete(i32),
    Error(i32),
    Exception(ExecErrorKind),
}

/// Builds `AsyncCallbacks` that append every invocation to a shared log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<CallbackEvent>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callbacks(&self) -> AsyncCallbacks {
        let data = Arc::clone(&self.events);
        let complete = Arc::clone(&self.events);
        let error = Arc::clone(&self.events);
        let exception = Arc::clone(&self.events);

        AsyncCallbacks::new()
            .on_data(move |line| data.lock().unwrap().push(CallbackEvent::Data(line)))
            .on_complete(move |code| complete.lock().unwrap().push(CallbackEvent::Complete(code)))
            .on_error(move |code| error.lock().unwrap().push(CallbackEvent::Error(code)))
            .on_exception(move |err| {
                exception
                    .lock()
                    .unwrap()
                    .push(CallbackEvent::Exception(err.kind()))
            })
    }

    pub fn events(&self) -> Vec<CallbackEvent> {
        self.events.lock().unwrap().clone()
    }

    /// True once a terminal callback has been recorded.
    pub fn finished(&self) -> bool {
        self.events
            .lock()
            .unwrap()
            .iter()
            .any(|e| !matches!(e, CallbackEvent::Data(_)))
    }
}
