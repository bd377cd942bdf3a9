// src/exec/executor_loop.rs

//! The single worker thread that services the job slot.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, info, trace};

pub const WORKER_THREAD_NAME: &str = "vcs-runner-worker";

/// A job as it travels through the slot.
///
/// `run` is type-erased: it already owns the job body and the reply slot of
/// the submitting caller, and it never unwinds (panics are caught inside and
/// turned into an `ExecError::Failure` reply).
pub(crate) struct Envelope {
    pub id: u64,
    pub abandoned: Arc<AtomicBool>,
    pub run: Box<dyn FnOnce() + Send + 'static>,
}

/// Spawn the worker thread.
///
/// The loop waits up to `poll_interval` for each job, runs it, and goes back
/// to waiting. It ends when every sender for the job slot is dropped, i.e.
/// when the last `ExecutionService` handle goes away.
pub(crate) fn spawn_worker(
    jobs: Receiver<Envelope>,
    poll_interval: Duration,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || worker_loop(jobs, poll_interval))
}

fn worker_loop(jobs: Receiver<Envelope>, poll_interval: Duration) {
    info!("worker thread started");

    loop {
        match jobs.recv_timeout(poll_interval) {
            Ok(envelope) => handle_envelope(envelope),
            Err(RecvTimeoutError::Timeout) => trace!("no job yet; still waiting"),
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    info!("worker thread finished (job channel closed)");
}

fn handle_envelope(envelope: Envelope) {
    let Envelope { id, abandoned, run } = envelope;

    if abandoned.load(Ordering::SeqCst) {
        debug!(job = id, "caller gave up before the job started; skipping");
        return;
    }

    debug!(job = id, "got job, processing");
    run();
    debug!(job = id, "job finished");
}
