//! Defaults file contents

use crate::core::sequencer::{Settings, DEFAULT_EOL, DEFAULT_TIMEOUT};
use crate::core::transfer::SAVE_IDLE_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Couldn't read config file {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`AppConfig`]
    #[error("Invalid config file {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },

    /// End-of-line value that does not describe a single byte
    #[error("Invalid end-of-line character: {0:?}")]
    InvalidEol(String),
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Initial values for a run
    pub defaults: DefaultsConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Initial values for a run; command-line actions override them in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Baud rate used by an open that no `--baud` precedes
    pub baud_rate: u32,
    /// Read timeout in milliseconds
    pub timeout_ms: u64,
    /// End-of-line character, same syntax as `--eolchar`
    pub eol_char: String,
    /// Start in quiet mode
    pub quiet: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            timeout_ms: u64::try_from(DEFAULT_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
            eol_char: "\\n".to_string(),
            quiet: false,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level filter (`RUST_LOG` wins when set)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the default location when `path` is `None`
    ///
    /// A missing default file yields the built-in defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match super::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load config from file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Initial sequencer settings
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let eol = if self.defaults.eol_char.is_empty() {
            DEFAULT_EOL
        } else {
            parse_eol_char(&self.defaults.eol_char)?
        };
        Ok(Settings {
            baud: self.defaults.baud_rate,
            timeout: Duration::from_millis(self.defaults.timeout_ms),
            eol,
            quiet: self.defaults.quiet,
            save_timeout: SAVE_IDLE_TIMEOUT,
        })
    }
}

/// Parse an end-of-line specification into one byte
///
/// Accepts `\n`, `\r`, `\t`, `\0`, `\\`, a hex byte such as `0x0d`, or any
/// other text, of which the first byte is used.
pub fn parse_eol_char(spec: &str) -> Result<u8, ConfigError> {
    let byte = match spec {
        "" => return Err(ConfigError::InvalidEol(spec.to_string())),
        "\\n" => b'\n',
        "\\r" => b'\r',
        "\\t" => b'\t',
        "\\0" => 0,
        "\\\\" => b'\\',
        _ => match spec.strip_prefix("0x").or_else(|| spec.strip_prefix("0X")) {
            Some(hex) if !hex.is_empty() => u8::from_str_radix(hex, 16)
                .map_err(|_| ConfigError::InvalidEol(spec.to_string()))?,
            _ => spec.as_bytes()[0],
        },
    };
    Ok(byte)
}
