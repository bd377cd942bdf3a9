use std::ffi::OsString;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Override for the `PATH` handed to spawned processes.
///
/// Accepts either form in the config file:
///
/// ```toml
/// force_path = "/usr/local/bin:/usr/bin"
/// force_path = ["/usr/local/bin", "/usr/bin"]
/// ```
///
/// A single string is used verbatim; a list is joined with the platform
/// path separator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ForcePath {
    Single(String),
    List(Vec<String>),
}

impl ForcePath {
    /// The value to install as `PATH`, or `None` when the override is empty
    /// (an empty override means "leave `PATH` alone").
    pub fn to_path_value(&self) -> Option<OsString> {
        match self {
            ForcePath::Single(s) if s.is_empty() => None,
            ForcePath::Single(s) => Some(OsString::from(s)),
            ForcePath::List(entries) if entries.is_empty() => None,
            ForcePath::List(entries) => std::env::join_paths(entries).ok(),
        }
    }
}

/// Which side of the job queue a bounded wait was spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffStage {
    /// Waiting for the job slot to accept the submission.
    Submit,
    /// Waiting for the worker to deliver the result.
    Result,
}

impl fmt::Display for HandoffStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandoffStage::Submit => f.write_str("submit"),
            HandoffStage::Result => f.write_str("result"),
        }
    }
}

/// Logical tools the runner knows how to build command lines for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Git,
    GitFlow,
    Legit,
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "git" => Ok(ToolKind::Git),
            "git-flow" | "git_flow" => Ok(ToolKind::GitFlow),
            "legit" => Ok(ToolKind::Legit),
            other => Err(format!(
                "invalid tool: {other} (expected \"git\", \"git-flow\" or \"legit\")"
            )),
        }
    }
}
