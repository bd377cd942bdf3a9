// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;
use crate::types::ToolKind;

/// Command-line arguments for `vcs-runner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "vcs-runner",
    version,
    about = "Run git (or git-flow / legit) through a serialized, timeout-bounded job queue.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `vcs-runner.toml` in the current working directory. A
    /// missing file means built-in defaults.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Which tool to run: git, git-flow or legit.
    #[arg(long, value_name = "TOOL", default_value = "git")]
    pub tool: ToolKind,

    /// Working directory for the command.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Stream output line by line (async path) instead of capturing it.
    #[arg(long)]
    pub stream: bool,

    /// Print the resolved command line, but don't execute it.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `VCS_RUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Arguments passed to the tool.
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
