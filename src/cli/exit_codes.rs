//! CLI Exit Codes
//!
//! Standard exit codes for scripted runs.

use crate::config::ConfigError;
use crate::core::sequencer::SequenceError;
use crate::core::transport::TransportError;
use std::process::ExitCode;

/// Exit code constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodes;

impl ExitCodes {
    /// Success
    pub const SUCCESS: u8 = 0;

    /// General error
    pub const ERROR: u8 = 1;

    /// Invalid arguments
    pub const INVALID_ARGS: u8 = 2;

    /// Port could not be opened
    pub const CONNECTION_FAILED: u8 = 3;

    /// Configuration error
    pub const CONFIG_ERROR: u8 = 8;

    /// Write did not complete
    pub const WRITE_FAILED: u8 = 10;

    /// Device failed while reading
    pub const READ_FAILED: u8 = 12;

    /// Baud rate outside the supported table
    pub const UNSUPPORTED_BAUD: u8 = 13;

    /// Action needed a port that was never opened
    pub const PORT_NOT_OPEN: u8 = 14;
}

/// CLI operation result
#[derive(Debug)]
pub enum CliResult {
    /// Success
    Success,

    /// Error with code and message
    Error(u8, String),
}

impl CliResult {
    /// Plain success
    pub fn success() -> Self {
        Self::Success
    }

    /// Error with an explicit code
    pub fn error(code: u8, msg: impl Into<String>) -> Self {
        Self::Error(code, msg.into())
    }

    /// Get exit code
    pub fn code(&self) -> u8 {
        match self {
            Self::Success => ExitCodes::SUCCESS,
            Self::Error(code, _) => *code,
        }
    }

    /// Convert to ExitCode
    pub fn to_exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

impl From<SequenceError> for CliResult {
    fn from(err: SequenceError) -> Self {
        let code = match &err {
            SequenceError::PortNotOpen { .. } => ExitCodes::PORT_NOT_OPEN,
            SequenceError::UnsupportedBaudRate(_) => ExitCodes::UNSUPPORTED_BAUD,
            SequenceError::Open(TransportError::UnsupportedBaudRate(_)) => ExitCodes::UNSUPPORTED_BAUD,
            SequenceError::Open(_) => ExitCodes::CONNECTION_FAILED,
            SequenceError::Write(_) => ExitCodes::WRITE_FAILED,
            SequenceError::Read(_) => ExitCodes::READ_FAILED,
            SequenceError::Transport(_) | SequenceError::Console(_) | SequenceError::Stdin(_) => {
                ExitCodes::ERROR
            }
        };
        Self::Error(code, err.to_string())
    }
}

impl From<ConfigError> for CliResult {
    fn from(err: ConfigError) -> Self {
        Self::Error(ExitCodes::CONFIG_ERROR, err.to_string())
    }
}
