// src/config/mod.rs

//! Configuration loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate encodings, executables and queue bounds (`validate.rs`).
//! - Answer settings lookups for the execution layer (`settings.rs`).

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, QueueSection, RawConfigFile, SettingsSection};
pub use settings::SettingsResolver;
pub use validate::parse_duration;
