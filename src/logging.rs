// src/logging.rs

//! Logging setup for `vcs-runner` using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from, in order:
//! 1. `--log-level` (applies to every target),
//! 2. `VCS_RUNNER_LOG`, read as `EnvFilter` directives, so per-module
//!    settings like `vcs_runner::exec=trace,info` work,
//! 3. `info`.
//!
//! Output goes to stderr, leaving stdout to the tool. Thread names are on
//! because the worker, dispatch and UI threads interleave.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "VCS_RUNNER_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Install the global subscriber. Call once, early in `main`.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let from_env = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, from_env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))
}

/// Pick the filter for a CLI level and the raw `VCS_RUNNER_LOG` value.
///
/// Malformed environment directives are ignored in favour of the default.
pub fn build_filter(cli_level: Option<LogLevel>, from_env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(level.directive());
    }

    from_env
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
