// src/exec/job.rs

//! What gets handed to the worker: one external-process invocation.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::types::ForcePath;

pub const DEFAULT_ENCODING: &str = "utf-8";

/// Immutable description of one external-process invocation.
///
/// Built by a caller at submission time and consumed exactly once by the
/// worker. The environment is a full mapping (not a delta): it starts as a
/// snapshot of the current process environment and is adjusted from there.
#[derive(Debug, Clone)]
pub struct Job {
    pub argv: Vec<String>,
    pub stdin: Option<Vec<u8>>,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<OsString, OsString>,
    pub encoding: String,
    pub fallback_encodings: Vec<String>,
    /// Turn spawn and decoding failures into an empty `(0, "", "")` result.
    pub ignore_errors: bool,
}

impl Job {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            stdin: None,
            cwd: None,
            env: std::env::vars_os().collect(),
            encoding: DEFAULT_ENCODING.to_string(),
            fallback_encodings: Vec::new(),
            ignore_errors: false,
        }
    }

    pub fn stdin(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env_var(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.env
            .insert(key.as_ref().to_os_string(), value.as_ref().to_os_string());
        self
    }

    /// Apply a `PATH` override. `None` or an empty override is a no-op.
    pub fn force_path(mut self, force_path: Option<&ForcePath>) -> Self {
        if let Some(path) = force_path.and_then(ForcePath::to_path_value) {
            self.env.insert(OsString::from("PATH"), path);
        }
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn fallback_encodings<I, S>(mut self, encodings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_encodings = encodings.into_iter().map(Into::into).collect();
        self
    }

    pub fn ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }

    /// `PATH` as the child will see it.
    pub fn path_var(&self) -> Option<&OsStr> {
        self.env.get(OsStr::new("PATH")).map(OsString::as_os_str)
    }
}

/// Captured outcome of a synchronous job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
