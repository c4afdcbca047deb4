//! TOML-based user settings.
//!
//! Stores the configurable work duration, rest duration, auto-start flag
//! and theme tag at `~/.config/eyebreak/config.toml`. A settings change
//! takes effect at the next cycle boundary: the timer snapshots durations
//! when a work phase starts, so an in-flight countdown is never rescaled.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, Result, ValidationError};

/// User-facing settings record.
///
/// Durations are kept in the units the settings form uses (minutes of work,
/// seconds of rest) and converted to whole seconds only when snapshotted
/// into the timer at cycle start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_rest_seconds")]
    pub rest_seconds: u32,
    #[serde(default)]
    pub auto_start: bool,
    /// Theme tag for the presentation layer; the timer ignores it.
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_work_minutes() -> u32 {
    20
}
fn default_rest_seconds() -> u32 {
    20
}
fn default_theme() -> String {
    "light".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            rest_seconds: default_rest_seconds(),
            auto_start: false,
            theme: default_theme(),
        }
    }
}

impl Settings {
    /// Reject non-positive durations. Invalid values are never clamped.
    ///
    /// # Errors
    /// Returns a validation error naming the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.work_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "work_minutes".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.rest_seconds == 0 {
            return Err(ValidationError::InvalidValue {
                field: "rest_seconds".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn work_duration_seconds(&self) -> u64 {
        u64::from(self.work_minutes) * 60
    }

    pub fn rest_duration_seconds(&self) -> u64 {
        u64::from(self.rest_seconds)
    }

    /// Get a settings value as string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "work_minutes" => Some(self.work_minutes.to_string()),
            "rest_seconds" => Some(self.rest_seconds.to_string()),
            "auto_start" => Some(self.auto_start.to_string()),
            "theme" => Some(self.theme.clone()),
            _ => None,
        }
    }

    /// Set a settings value by key, validating the result.
    ///
    /// Mutates only on success; the previous value is kept when the new one
    /// is rejected.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting settings fail validation.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        match key {
            "work_minutes" => updated.work_minutes = parse_u32(key, value)?,
            "rest_seconds" => updated.rest_seconds = parse_u32(key, value)?,
            "auto_start" => {
                updated.auto_start = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as bool"),
                })?;
            }
            "theme" => updated.theme = value.trim().to_string(),
            other => {
                return Err(ConfigError::InvalidValue {
                    key: other.to_string(),
                    message: "unknown settings key".to_string(),
                }
                .into())
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn parse_u32(key: &str, value: &str) -> Result<u32> {
    value
        .parse::<u32>()
        .map_err(|_| {
            ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("cannot parse '{value}' as number"),
            }
            .into()
        })
}

/// File-backed settings store.
///
/// Serialized to/from TOML; the settings record is independent of the
/// stats database and read/written on its own.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Open the store at the default data directory.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn open() -> Result<Self> {
        Ok(Self {
            path: data_dir()?.join("config.toml"),
        })
    }

    /// Open a store at an explicit path (for tests).
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load from disk, writing the default file when none exists.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be parsed, or if the
    /// default settings cannot be written.
    pub fn load(&self) -> Result<Settings> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let settings: Settings =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                Ok(settings)
            }
            Err(_) => {
                let settings = Settings::default();
                self.save(&settings)?;
                Ok(settings)
            }
        }
    }

    /// Load from disk, returning defaults on error.
    pub fn load_or_default(&self) -> Settings {
        self.load().unwrap_or_default()
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the settings cannot be serialized or written.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let content =
            toml::to_string_pretty(settings).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| ConfigError::SaveFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}
