//! Configuration module
//!
//! Handles the optional defaults file

mod settings;

pub use settings::{parse_eol_char, AppConfig, ConfigError, DefaultsConfig, LoggingConfig};

use directories::ProjectDirs;
use std::path::PathBuf;

/// Get the application configuration directory
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "uartctl", "uartctl").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Default location of the configuration file
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}
