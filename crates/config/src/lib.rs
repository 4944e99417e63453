//! Configuration loading for mail-intake tools
//!
//! Every file the tools read or write lives under one base directory:
//! `$MAIL_INTAKE_HOME` when set, otherwise `<user config dir>/mail-intake`.
//!
//! Call [`init`] at application startup to bootstrap the base directory.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Environment variable overriding the base directory
pub const HOME_ENV: &str = "MAIL_INTAKE_HOME";

/// Initialize the base directory.
///
/// Creates it if it doesn't exist. Call this once at application startup.
pub fn init() -> Result<PathBuf> {
    let dir = base_dir().context("Could not determine base directory")?;
    ensure_dir(&dir)?;
    Ok(dir)
}

/// Get the base directory (`$MAIL_INTAKE_HOME` or ~/.config/mail-intake/)
pub fn base_dir() -> Option<PathBuf> {
    match std::env::var_os(HOME_ENV) {
        Some(home) if !home.is_empty() => Some(PathBuf::from(home)),
        _ => dirs::config_dir().map(|p| p.join("mail-intake")),
    }
}

/// Load and parse a JSON file from an arbitrary path
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Create a directory and its parents if missing
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))
}
