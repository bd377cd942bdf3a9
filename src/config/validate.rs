// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, QueueSection, RawConfigFile};
use crate::decode::is_known_label;
use crate::errors::{Result, VcsRunnerError};
use crate::exec::QueueOptions;
use crate::types::ForcePath;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::VcsRunnerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let queue = queue_options(&raw.queue)?;
        Ok(ConfigFile::new_unchecked(raw.settings, raw.executables, queue))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_encodings(cfg)?;
    validate_force_path(cfg)?;
    validate_executables(cfg)?;
    Ok(())
}

fn validate_encodings(cfg: &RawConfigFile) -> Result<()> {
    let settings = &cfg.settings;

    if !is_known_label(&settings.encoding) {
        return Err(VcsRunnerError::ConfigError(format!(
            "[settings].encoding: unknown encoding '{}'",
            settings.encoding
        )));
    }

    for label in settings.fallback_encodings.iter() {
        if !is_known_label(label) {
            return Err(VcsRunnerError::ConfigError(format!(
                "[settings].fallback_encodings: unknown encoding '{}'",
                label
            )));
        }
    }

    Ok(())
}

fn validate_force_path(cfg: &RawConfigFile) -> Result<()> {
    if let Some(ForcePath::List(entries)) = &cfg.settings.force_path {
        if let Err(e) = std::env::join_paths(entries) {
            return Err(VcsRunnerError::ConfigError(format!(
                "[settings].force_path: {e}"
            )));
        }
    }
    Ok(())
}

fn validate_executables(cfg: &RawConfigFile) -> Result<()> {
    for (name, argv) in cfg.executables.iter() {
        if argv.is_empty() || argv[0].trim().is_empty() {
            return Err(VcsRunnerError::ConfigError(format!(
                "[executables].{} must name a program (got {:?})",
                name, argv
            )));
        }
    }
    Ok(())
}

fn queue_options(section: &QueueSection) -> Result<QueueOptions> {
    Ok(QueueOptions {
        submit_timeout: positive_duration("submit_timeout", &section.submit_timeout)?,
        result_timeout: positive_duration("result_timeout", &section.result_timeout)?,
        async_result_timeout: positive_duration(
            "async_result_timeout",
            &section.async_result_timeout,
        )?,
        worker_poll_interval: positive_duration(
            "worker_poll_interval",
            &section.worker_poll_interval,
        )?,
    })
}

fn positive_duration(key: &str, value: &str) -> Result<Duration> {
    let duration = parse_duration(value)
        .map_err(|e| VcsRunnerError::ConfigError(format!("[queue].{key}: {e}")))?;

    if duration.is_zero() {
        return Err(VcsRunnerError::ConfigError(format!(
            "[queue].{key} must be greater than zero (got \"{value}\")"
        )));
    }
    Ok(duration)
}

/// Parse durations like `"500ms"`, `"10s"`, `"2m"`, `"1h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is out of range", s))
}
