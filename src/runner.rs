// src/runner.rs

//! Caller-facing helpers on top of the execution service.
//!
//! A [`Tool`] says how to invoke one logical executable (`git`, `git-flow`,
//! `legit`); a [`CommandRunner`] pairs it with settings, the execution
//! service and the UI dispatcher, and offers the everyday entry points:
//! [`cmd`](CommandRunner::cmd), [`string`](CommandRunner::string),
//! [`lines`](CommandRunner::lines), [`exit_code`](CommandRunner::exit_code)
//! and [`cmd_async`](CommandRunner::cmd_async).

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::SettingsResolver;
use crate::decode::encode;
use crate::errors::ExecError;
use crate::exec::{AsyncCallbacks, AsyncHandle, CommandOutput, ExecutionService, Job};
use crate::types::ToolKind;
use crate::ui::UiDispatcher;

const GIT_OPTS: &[&str] = &[
    "--no-pager",
    "-c",
    "color.diff=false",
    "-c",
    "color.status=false",
    "-c",
    "color.branch=false",
    "-c",
    "status.displayCommentPrefix=true",
    "-c",
    "core.commentchar=#",
];

/// How to invoke one logical executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    /// Key under `[executables]` that can override `default_bin`.
    pub settings_key: String,
    pub default_bin: Vec<String>,
    /// Inserted between the executable and the caller's arguments.
    pub opts: Vec<String>,
}

impl Tool {
    pub fn new<B, O, S, T>(settings_key: impl Into<String>, default_bin: B, opts: O) -> Self
    where
        B: IntoIterator<Item = S>,
        S: Into<String>,
        O: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            settings_key: settings_key.into(),
            default_bin: default_bin.into_iter().map(Into::into).collect(),
            opts: opts.into_iter().map(Into::into).collect(),
        }
    }

    /// git with paging and colours off and a stable comment prefix, so
    /// output is machine-readable.
    pub fn git() -> Self {
        Self::new("git", ["git"], GIT_OPTS.iter().copied())
    }

    pub fn git_flow() -> Self {
        Self::new("git_flow", ["git-flow"], std::iter::empty::<&str>())
    }

    pub fn legit() -> Self {
        Self::new("legit", ["legit"], std::iter::empty::<&str>())
    }

    pub fn for_kind(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Git => Self::git(),
            ToolKind::GitFlow => Self::git_flow(),
            ToolKind::Legit => Self::legit(),
        }
    }
}

/// Standard-input payload for a synchronous command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdinPayload {
    /// Encoded with the command's encoding before it is written.
    Text(String),
    Bytes(Vec<u8>),
}

/// Per-call options for [`CommandRunner::cmd`]. Unset encodings come from
/// settings.
#[derive(Debug, Clone, Default)]
pub struct CmdOptions {
    pub stdin: Option<StdinPayload>,
    pub cwd: Option<PathBuf>,
    pub ignore_errors: bool,
    pub encoding: Option<String>,
    pub fallback_encodings: Option<Vec<String>>,
}

impl CmdOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdin_text(mut self, text: impl Into<String>) -> Self {
        self.stdin = Some(StdinPayload::Text(text.into()));
        self
    }

    pub fn stdin_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(StdinPayload::Bytes(bytes.into()));
        self
    }

    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn fallback_encodings<I, S>(mut self, encodings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_encodings = Some(encodings.into_iter().map(Into::into).collect());
        self
    }
}

/// Runs one tool's commands through the shared execution service.
#[derive(Clone)]
pub struct CommandRunner {
    tool: Tool,
    service: ExecutionService,
    settings: Arc<dyn SettingsResolver>,
    ui: Arc<dyn UiDispatcher>,
}

impl fmt::Debug for CommandRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRunner")
            .field("tool", &self.tool)
            .field("service", &self.service)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl CommandRunner {
    pub fn new(
        tool: Tool,
        service: ExecutionService,
        settings: Arc<dyn SettingsResolver>,
        ui: Arc<dyn UiDispatcher>,
    ) -> Self {
        Self {
            tool,
            service,
            settings,
            ui,
        }
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    /// Executable (from settings, or the tool default) + tool options +
    /// every non-empty argument.
    pub fn build_command<I, S>(&self, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bin = self
            .settings
            .resolve_executable(&self.tool.settings_key)
            .unwrap_or_else(|| self.tool.default_bin.clone());

        bin.into_iter()
            .chain(self.tool.opts.iter().cloned())
            .chain(
                args.into_iter()
                    .filter(|a| !a.as_ref().is_empty())
                    .map(|a| a.as_ref().to_string()),
            )
            .collect()
    }

    /// Build the [`Job`] for `args` without running it.
    pub fn job<I, S>(&self, args: I, opts: CmdOptions) -> Job
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let encoding = opts.encoding.unwrap_or_else(|| self.settings.encoding());
        let fallback = opts
            .fallback_encodings
            .unwrap_or_else(|| self.settings.fallback_encodings());

        let mut job = Job::new(self.build_command(args))
            .force_path(self.settings.force_path().as_ref())
            .ignore_errors(opts.ignore_errors)
            .fallback_encodings(fallback);

        match opts.stdin {
            Some(StdinPayload::Text(text)) => job = job.stdin(encode(&text, &encoding)),
            Some(StdinPayload::Bytes(bytes)) => job = job.stdin(bytes),
            None => {}
        }
        if let Some(cwd) = opts.cwd {
            job = job.cwd(cwd);
        }

        job.encoding(encoding)
    }

    /// Run synchronously and return `(exit_code, stdout, stderr)`.
    pub fn cmd<I, S>(&self, args: I, opts: CmdOptions) -> Result<CommandOutput, ExecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.service.run_sync(self.job(args, opts))
    }

    /// Stdout only, trimmed when `strip` is set.
    pub fn string<I, S>(&self, args: I, strip: bool, opts: CmdOptions) -> Result<String, ExecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let output = self.cmd(args, opts)?;
        Ok(if strip {
            output.stdout.trim().to_string()
        } else {
            output.stdout
        })
    }

    /// Stdout split into lines; empty output gives an empty list.
    pub fn lines<I, S>(&self, args: I, opts: CmdOptions) -> Result<Vec<String>, ExecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let output = self.cmd(args, opts)?;
        let stdout = output.stdout.trim_end();
        if stdout.is_empty() {
            return Ok(Vec::new());
        }
        Ok(stdout.split('\n').map(str::to_string).collect())
    }

    pub fn exit_code<I, S>(&self, args: I, opts: CmdOptions) -> Result<i32, ExecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(self.cmd(args, opts)?.exit_code)
    }

    /// Run asynchronously, streaming output lines to `callbacks`.
    pub fn cmd_async<I, S>(
        &self,
        args: I,
        cwd: Option<&Path>,
        callbacks: AsyncCallbacks,
    ) -> Result<AsyncHandle, ExecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut opts = CmdOptions::new();
        if let Some(cwd) = cwd {
            opts = opts.cwd(cwd);
        }
        let job = self.job(args, opts);
        self.service.run_async(job, Arc::clone(&self.ui), callbacks)
    }

    /// A message fit for an error dialog, with hints on which setting to
    /// adjust.
    pub fn describe_error(&self, err: &ExecError) -> String {
        match err {
            ExecError::Spawn { program, path, .. } => {
                let entries = std::env::split_paths(path)
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join("\n");
                format!(
                    "Executable '{program}' was not found in PATH. Current PATH:\n\n{entries}\n\n\
                     Try adjusting the executables.{} setting.",
                    self.tool.settings_key
                )
            }
            ExecError::Decoding(decode) => format!(
                "Could not decode the output of {}. Some commit message or file \
                 is probably in an unrecognized encoding. Encodings tried:\n\n{}\n\n\
                 Try adjusting the fallback_encodings setting.",
                self.tool.default_bin.join(" "),
                decode.attempted.join("\n")
            ),
            other => other.to_string(),
        }
    }
}
