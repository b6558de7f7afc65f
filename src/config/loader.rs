//! Configuration file loading and saving
//!
//! This module handles loading configuration from a JSON file (by default
//! ~/.guestbook-notifier.json) and writing it back out.

use crate::config::schema::AppConfig;
use crate::error::{NotifierError, Result};
use dirs::home_dir;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".guestbook-notifier.json";

/// Get the default configuration file path
/// Returns ~/.guestbook-notifier.json, or the working directory when no home
/// directory is known (kiosk service accounts)
pub fn get_config_path() -> PathBuf {
    home_dir()
        .map(|home| home.join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Load configuration from a specific path
/// If the file doesn't exist, returns a default configuration
pub fn load_config_from_path(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(default_config());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        NotifierError::ConfigError(format!("Failed to read config file: {}", e))
    })?;

    let config: AppConfig = serde_json::from_str(&content).map_err(|e| {
        NotifierError::ConfigError(format!("Failed to parse config JSON: {}", e))
    })?;

    Ok(config)
}

/// Save configuration to a specific path
pub fn save_config_to_path(config: &AppConfig, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config).map_err(|e| {
        NotifierError::ConfigError(format!("Failed to serialize config: {}", e))
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            NotifierError::ConfigError(format!("Failed to create config directory: {}", e))
        })?;
    }

    fs::write(path, content)
        .map_err(|e| NotifierError::ConfigError(format!("Failed to write config: {}", e)))?;

    Ok(())
}

/// Create a default configuration
pub fn default_config() -> AppConfig {
    AppConfig::default()
}
