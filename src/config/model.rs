// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::exec::QueueOptions;
use crate::exec::job::DEFAULT_ENCODING;
use crate::types::ForcePath;

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [settings]
/// encoding = "utf-8"
/// fallback_encodings = ["latin-1"]
/// force_path = ["/usr/local/bin", "/usr/bin"]
///
/// [executables]
/// git = ["git"]
/// git_flow = ["git-flow"]
///
/// [queue]
/// submit_timeout = "10s"
/// result_timeout = "10s"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub settings: SettingsSection,

    /// Executable vectors keyed by logical tool name (`git`, `git_flow`,
    /// `legit`). Tools without an entry use their built-in default.
    #[serde(default)]
    pub executables: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub queue: QueueSection,
}

/// `[settings]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsSection {
    /// Primary encoding for decoding output and encoding stdin.
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Tried in order when `encoding` fails to decode.
    #[serde(default)]
    pub fallback_encodings: Vec<String>,

    /// Replaces `PATH` for spawned processes when set.
    #[serde(default)]
    pub force_path: Option<ForcePath>,
}

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            encoding: default_encoding(),
            fallback_encodings: Vec::new(),
            force_path: None,
        }
    }
}

/// `[queue]` section. Durations are strings like `"500ms"`, `"10s"`, `"1m"`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueSection {
    #[serde(default = "default_handoff_timeout")]
    pub submit_timeout: String,

    #[serde(default = "default_handoff_timeout")]
    pub result_timeout: String,

    #[serde(default = "default_handoff_timeout")]
    pub async_result_timeout: String,

    #[serde(default = "default_poll_interval")]
    pub worker_poll_interval: String,
}

fn default_handoff_timeout() -> String {
    "10s".to_string()
}

fn default_poll_interval() -> String {
    "1s".to_string()
}

impl Default for QueueSection {
    fn default() -> Self {
        Self {
            submit_timeout: default_handoff_timeout(),
            result_timeout: default_handoff_timeout(),
            async_result_timeout: default_handoff_timeout(),
            worker_poll_interval: default_poll_interval(),
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (or [`Default`]), so the
/// encodings are known, executable vectors are non-empty and the queue
/// durations are parsed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub settings: SettingsSection,
    pub executables: BTreeMap<String, Vec<String>>,
    pub queue: QueueOptions,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        settings: SettingsSection,
        executables: BTreeMap<String, Vec<String>>,
        queue: QueueOptions,
    ) -> Self {
        Self {
            settings,
            executables,
            queue,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            SettingsSection::default(),
            BTreeMap::new(),
            QueueOptions::default(),
        )
    }
}
