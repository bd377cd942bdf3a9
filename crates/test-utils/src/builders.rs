#![allow(dead_code)]

use std::collections::BTreeMap;
use std::time::Duration;

use vcs_runner::config::{ConfigFile, QueueSection, RawConfigFile, SettingsSection};
use vcs_runner::exec::QueueOptions;
use vcs_runner::types::ForcePath;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                settings: SettingsSection::default(),
                executables: BTreeMap::new(),
                queue: QueueSection::default(),
            },
        }
    }

    pub fn encoding(mut self, encoding: &str) -> Self {
        self.config.settings.encoding = encoding.to_string();
        self
    }

    pub fn fallback_encoding(mut self, encoding: &str) -> Self {
        self.config.settings.fallback_encodings.push(encoding.to_string());
        self
    }

    pub fn force_path(mut self, force_path: ForcePath) -> Self {
        self.config.settings.force_path = Some(force_path);
        self
    }

    pub fn executable(mut self, logical_name: &str, argv: &[&str]) -> Self {
        self.config.executables.insert(
            logical_name.to_string(),
            argv.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn result_timeout(mut self, value: &str) -> Self {
        self.config.queue.result_timeout = value.to_string();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Queue bounds short enough for tests that expect a timeout.
pub fn queue_options(submit: Duration, result: Duration) -> QueueOptions {
    QueueOptions {
        submit_timeout: submit,
        result_timeout: result,
        async_result_timeout: result,
        worker_poll_interval: Duration::from_millis(50),
    }
}
