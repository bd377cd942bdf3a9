// src/exec/task_runner.rs

//! Running a single job to completion on the worker thread.
//!
//! - [`run_captured`] pipes stdin/stdout/stderr, waits, and decodes both
//!   output streams (sync path).
//! - [`run_streaming`] merges stderr into stdout and hands every decoded
//!   line to a callback as soon as it is read (async path).

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Stdio};
use std::thread;

use tracing::{debug, trace, warn};

use crate::decode::decode;
use crate::errors::ExecError;
use crate::exec::job::{CommandOutput, Job};
use crate::exec::process::{command_for, exit_code, spawn};

/// Run `job`, capture its output, and decode it.
///
/// With `ignore_errors` set, spawn and decoding failures become an empty
/// successful result instead of an error.
pub fn run_captured(job: Job) -> Result<CommandOutput, ExecError> {
    let ignore_errors = job.ignore_errors;
    let argv = job.argv.clone();

    match capture(job) {
        Err(err @ (ExecError::Spawn { .. } | ExecError::Decoding(_))) if ignore_errors => {
            debug!(?argv, error = %err, "ignoring command error");
            Ok(CommandOutput::default())
        }
        other => other,
    }
}

fn capture(job: Job) -> Result<CommandOutput, ExecError> {
    debug!(argv = ?job.argv, cwd = ?job.cwd, "cmd");

    let mut command = command_for(&job)?;
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = spawn(&mut command, &job)?;

    // Feed stdin from a helper thread so a large payload can't deadlock
    // against a child that is blocked writing to a full stdout pipe.
    let feeder = child.stdin.take().map(|mut stdin| {
        let payload = job.stdin.clone().unwrap_or_default();
        thread::spawn(move || {
            if !payload.is_empty() {
                if let Err(e) = stdin.write_all(&payload) {
                    debug!(error = %e, "child closed stdin early");
                }
            }
        })
    });

    let output = child
        .wait_with_output()
        .map_err(|e| ExecError::failure(format!("waiting for '{}': {e}", job.argv[0])))?;

    if let Some(feeder) = feeder {
        if feeder.join().is_err() {
            warn!(argv = ?job.argv, "stdin writer thread panicked");
        }
    }

    let exit_code = exit_code(output.status);
    debug!(
        exit_code,
        stdout_len = output.stdout.len(),
        stderr_len = output.stderr.len(),
        "out"
    );

    Ok(CommandOutput {
        exit_code,
        stdout: decode(&output.stdout, &job.encoding, &job.fallback_encodings)?,
        stderr: decode(&output.stderr, &job.encoding, &job.fallback_encodings)?,
    })
}

/// Run `job` with stderr merged into stdout, calling `on_line` for every
/// decoded line (without its line terminator) as it arrives.
///
/// Returns the exit code. If a line fails to decode, the remaining output is
/// still drained so the child can finish, and the decoding error is
/// returned after it exits.
pub fn run_streaming<F>(job: Job, mut on_line: F) -> Result<i32, ExecError>
where
    F: FnMut(String),
{
    debug!(argv = ?job.argv, cwd = ?job.cwd, "async-cmd");

    let (reader, writer) =
        std::io::pipe().map_err(|e| ExecError::failure(format!("creating output pipe: {e}")))?;
    let writer_err = writer
        .try_clone()
        .map_err(|e| ExecError::failure(format!("duplicating output pipe: {e}")))?;

    let mut command = command_for(&job)?;
    command
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(writer_err);

    let mut child = spawn(&mut command, &job)?;
    // The command still owns our copies of the write end; the reader only
    // sees EOF once they are gone.
    drop(command);

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut decode_failure = None;

    loop {
        buf.clear();
        let read = match reader.read_until(b'\n', &mut buf) {
            Ok(n) => n,
            Err(e) => {
                reap(&mut child);
                return Err(ExecError::failure(format!("reading output of '{}': {e}", job.argv[0])));
            }
        };
        if read == 0 {
            break;
        }
        if decode_failure.is_some() {
            continue;
        }

        match decode(trim_line_end(&buf), &job.encoding, &job.fallback_encodings) {
            Ok(line) => {
                trace!(line = %line, "async-out");
                on_line(line);
            }
            Err(err) => decode_failure = Some(err),
        }
    }

    let status = child
        .wait()
        .map_err(|e| ExecError::failure(format!("waiting for '{}': {e}", job.argv[0])))?;
    let code = exit_code(status);
    debug!(exit_code = code, "async-exit");

    match decode_failure {
        Some(err) => Err(err.into()),
        None => Ok(code),
    }
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "kill after read error failed");
    }
    let _ = child.wait();
}
