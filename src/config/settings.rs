// src/config/settings.rs

use std::fmt::Debug;

use crate::config::model::ConfigFile;
use crate::types::ForcePath;

/// Pure lookups the execution layer needs from configuration.
pub trait SettingsResolver: Send + Sync + Debug {
    /// Executable vector configured for a logical tool name, if any.
    fn resolve_executable(&self, logical_name: &str) -> Option<Vec<String>>;

    fn encoding(&self) -> String;

    fn fallback_encodings(&self) -> Vec<String>;

    fn force_path(&self) -> Option<ForcePath>;
}

impl SettingsResolver for ConfigFile {
    fn resolve_executable(&self, logical_name: &str) -> Option<Vec<String>> {
        self.executables.get(logical_name).cloned()
    }

    fn encoding(&self) -> String {
        self.settings.encoding.clone()
    }

    fn fallback_encodings(&self) -> Vec<String> {
        self.settings.fallback_encodings.clone()
    }

    fn force_path(&self) -> Option<ForcePath> {
        self.settings.force_path.clone()
    }
}
