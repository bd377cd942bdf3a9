// src/errors.rs

//! Crate-wide error types.
//!
//! [`ExecError`] is the failure half of every job submitted to the
//! execution service. [`VcsRunnerError`] covers everything around it
//! (configuration, IO at startup, CLI wiring).

use std::time::Duration;

use thiserror::Error;

use crate::decode::DecodeError;
use crate::types::HandoffStage;

/// Typed failure for a single job.
///
/// Every submitted job terminates with exactly one normal result or exactly
/// one of these. None of them take the worker thread down.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The executable could not be located or started.
    #[error("could not start '{program}': {source}")]
    Spawn {
        program: String,
        /// `PATH` in effect for the lookup.
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A bounded hand-off across the job queue expired. The external
    /// process may still be running.
    #[error("could not execute command (timed out after {after:?} waiting on {stage})")]
    Timeout { stage: HandoffStage, after: Duration },

    /// Output did not decode under any configured encoding.
    #[error(transparent)]
    Decoding(#[from] DecodeError),

    /// Unexpected fault inside the worker while running a job.
    #[error("unhandled fault in job: {message}")]
    Failure { message: String },
}

/// Coarse classification of an [`ExecError`], handy when the error itself
/// has to be consumed (e.g. moved into a callback).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecErrorKind {
    Spawn,
    Timeout,
    Decoding,
    Failure,
}

impl ExecError {
    pub fn kind(&self) -> ExecErrorKind {
        match self {
            ExecError::Spawn { .. } => ExecErrorKind::Spawn,
            ExecError::Timeout { .. } => ExecErrorKind::Timeout,
            ExecError::Decoding(_) => ExecErrorKind::Decoding,
            ExecError::Failure { .. } => ExecErrorKind::Failure,
        }
    }

    pub(crate) fn failure(message: impl Into<String>) -> Self {
        ExecError::Failure {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum VcsRunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Execution error: {0}")]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, VcsRunnerError>;
