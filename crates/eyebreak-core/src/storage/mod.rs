mod config;
mod database;

pub use config::{Settings, SettingsStore};
pub use database::{DailyStats, Database};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/eyebreak[-dev]/` based on EYEBREAK_ENV.
///
/// Set EYEBREAK_ENV=dev to use the development data directory, or
/// EYEBREAK_DATA_DIR to point at an arbitrary directory (used by the
/// CLI end-to-end tests).
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("EYEBREAK_DATA_DIR") {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir)?;
        return Ok(dir);
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("EYEBREAK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("eyebreak-dev")
    } else {
        base_dir.join("eyebreak")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
