// src/exec/process.rs

//! External-process creation.
//!
//! The executable is resolved against the job's own `PATH` (which may carry
//! a `force_path` override) before spawning, so a missing binary surfaces
//! as [`ExecError::Spawn`] with the `PATH` that was searched. The working
//! directory is applied per child; the process-wide cwd is never touched.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus};

use tracing::debug;

use crate::errors::ExecError;
use crate::exec::job::Job;

/// Build a `Command` for `job` with the resolved executable, arguments,
/// environment and working directory. Stdio is left to the caller.
pub(crate) fn command_for(job: &Job) -> Result<Command, ExecError> {
    let (program, args) = job
        .argv
        .split_first()
        .ok_or_else(|| ExecError::failure("empty argument vector"))?;

    let executable = resolve_executable(job, program)?;

    let mut command = Command::new(&executable);
    command.args(args).env_clear().envs(&job.env);

    if let Some(cwd) = &job.cwd {
        command.current_dir(cwd);
    }

    hide_console_window(&mut command);

    debug!(program = %program, executable = %executable.display(), "resolved executable");
    Ok(command)
}

/// Spawn `command`, mapping start-up failures to [`ExecError::Spawn`].
pub(crate) fn spawn(command: &mut Command, job: &Job) -> Result<Child, ExecError> {
    command.spawn().map_err(|source| ExecError::Spawn {
        program: job.argv.first().cloned().unwrap_or_default(),
        path: display_path(job.path_var()),
        source,
    })
}

/// Numeric exit status; `-1` when the child was terminated by a signal.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

fn resolve_executable(job: &Job, program: &str) -> Result<PathBuf, ExecError> {
    let cwd = match &job.cwd {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    which::which_in(program, job.path_var(), cwd).map_err(|err| ExecError::Spawn {
        program: program.to_string(),
        path: display_path(job.path_var()),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, err),
    })
}

fn display_path(path: Option<&OsStr>) -> String {
    path.map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(windows)]
fn hide_console_window(command: &mut Command) {
    use std::os::windows::process::CommandExt;

    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    command.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_console_window(_command: &mut Command) {}
