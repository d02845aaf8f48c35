//! Transport layer
//!
//! Every byte that reaches or leaves the device goes through [`SerialLink`].
//! The real implementation is [`SerialTransport`]; [`MemoryLink`] is an
//! in-memory loopback used for dry runs and tests.

mod baud;
mod memory;
mod serial;

pub use baud::{BaudRate, SUPPORTED_BAUD_RATES};
pub use memory::{MemoryConnector, MemoryLink};
pub use serial::{list_ports, SerialConfig, SerialConnector, SerialTransport};

use std::time::Duration;
use thiserror::Error;

/// Transport error types
#[derive(Error, Debug)]
pub enum TransportError {
    /// Port not found
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The device could not be opened or configured as a serial line
    #[error("Couldn't open port {path}: {reason}")]
    OpenFailed {
        /// Device path
        path: String,
        /// Reason reported by the OS
        reason: String,
    },

    /// Baud rate outside the supported table
    #[error("Unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),

    /// Operation on a handle that has been closed
    #[error("Port is closed")]
    Closed,

    /// Write refused or incomplete
    #[error("Write error: {0}")]
    Write(#[source] std::io::Error),

    /// Read failed for a reason other than a timeout
    #[error("Read error: {0}")]
    Read(#[source] std::io::Error),

    /// Discarding or draining buffers failed
    #[error("Buffer control error: {0}")]
    Control(String),
}

impl TransportError {
    pub(crate) fn short_write() -> Self {
        Self::Write(std::io::Error::new(
            std::io::ErrorKind::WriteZero,
            "device accepted zero bytes",
        ))
    }
}

/// Result of a single-byte read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A byte arrived before the deadline
    Byte(u8),
    /// Nothing arrived before the deadline
    Timeout,
}

impl ReadOutcome {
    /// The byte, if one arrived
    pub fn byte(self) -> Option<u8> {
        match self {
            Self::Byte(b) => Some(b),
            Self::Timeout => None,
        }
    }
}

/// Blocking byte-level access to an open serial line
#[cfg_attr(test, mockall::automock)]
pub trait SerialLink {
    /// Write exactly one byte
    fn write_byte(&mut self, byte: u8) -> Result<usize, TransportError>;

    /// Write the whole buffer, retrying partial writes
    fn write_buffer(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Discard unread input and untransmitted output
    fn flush(&mut self) -> Result<(), TransportError>;

    /// Block until queued output has been transmitted
    fn drain(&mut self) -> Result<(), TransportError>;

    /// Wait up to `timeout` for one byte
    fn read_byte(&mut self, timeout: Duration) -> Result<ReadOutcome, TransportError>;

    /// Release the device. Closing twice is a no-op.
    fn close(&mut self);

    /// Check if the handle is still open
    fn is_open(&self) -> bool;
}

/// Opens links for the sequencer
pub trait Connector {
    /// Link type produced by this connector
    type Link: SerialLink;

    /// Open and configure the device described by `config`
    fn connect(&mut self, config: &SerialConfig) -> Result<Self::Link, TransportError>;
}
