// src/ui.rs

//! The "post to the UI thread" capability.
//!
//! The execution core only ever calls [`UiDispatcher::post`]. Hosts with
//! their own event loop implement the trait directly; everyone else can use
//! [`channel`], which hands back a tokio-backed queue and the loop that
//! drains it.

use std::fmt;

use tokio::sync::mpsc;
use tracing::debug;

/// A unit of work to run on the UI thread.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Something that can schedule a closure on the host's UI task loop.
///
/// Tasks posted from any single thread must run in the order they were
/// posted, one at a time.
pub trait UiDispatcher: Send + Sync {
    fn post(&self, task: UiTask);
}

/// Create a UI task queue.
pub fn channel() -> (UiHandle, UiLoop) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiHandle { tx }, UiLoop { rx })
}

/// Posting side of the queue. Clone freely.
#[derive(Clone)]
pub struct UiHandle {
    tx: mpsc::UnboundedSender<UiTask>,
}

impl fmt::Debug for UiHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl UiDispatcher for UiHandle {
    fn post(&self, task: UiTask) {
        if self.tx.send(task).is_err() {
            debug!("UI loop is gone; dropping task");
        }
    }
}

/// Draining side of the queue: the "UI thread".
pub struct UiLoop {
    rx: mpsc::UnboundedReceiver<UiTask>,
}

impl fmt::Debug for UiLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiLoop").finish_non_exhaustive()
    }
}

impl UiLoop {
    /// Run tasks until every [`UiHandle`] has been dropped.
    pub async fn run(mut self) {
        while let Some(task) = self.rx.recv().await {
            task();
        }
        debug!("UI loop finished (all handles dropped)");
    }

    /// Run tasks while `keep_going` returns true, checked before each task.
    ///
    /// Returns early if every handle is dropped.
    pub async fn run_while<F>(&mut self, mut keep_going: F)
    where
        F: FnMut() -> bool,
    {
        while keep_going() {
            match self.rx.recv().await {
                Some(task) => task(),
                None => break,
            }
        }
    }

    /// Run whatever is queued right now without waiting; returns how many
    /// tasks ran. For hosts that pump their own event loop.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }
}
