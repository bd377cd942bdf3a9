// src/exec/mod.rs

//! Process execution layer.
//!
//! Every external process goes through one [`ExecutionService`], which owns
//! a single worker thread and a capacity-1 job slot. That keeps process
//! executions strictly serialized regardless of how many callers there are.
//!
//! - [`service`] owns the job slot, the worker handle and the sync path.
//! - [`executor_loop`] is the worker thread itself.
//! - [`async_runner`] is the async path (dispatch thread + UI callbacks).
//! - [`task_runner`] runs one job: captured or streamed.
//! - [`process`] builds and spawns the child process.
//! - [`job`] is the job description and its captured output.

pub mod async_runner;
pub(crate) mod executor_loop;
pub mod job;
pub(crate) mod process;
pub mod service;
pub mod task_runner;

pub use async_runner::{AsyncCallbacks, AsyncHandle};
pub use job::{CommandOutput, Job};
pub use service::{ExecutionService, QueueOptions};
