//! # uartctl Core Library
//!
//! Scripted serial-port conversations from the command line:
//! - Ordered actions (set baud, open, send, receive, delay, flush)
//! - Raw 8N1 ports with per-byte read timeouts
//! - Paced file upload and idle-bounded capture to a file
//! - An in-memory link for dry runs and tests
//!
//! ## Example
//!
//! ```rust,no_run
//! use uartctl_core::core::action::Action;
//! use uartctl_core::core::sequencer::{Sequencer, Settings};
//! use uartctl_core::core::transport::SerialConnector;
//!
//! fn main() -> anyhow::Result<()> {
//!     let actions = [
//!         Action::SetBaud(115_200),
//!         Action::OpenPort("/dev/ttyACM0".into()),
//!         Action::SendLine("AT".into()),
//!         Action::ReceiveLine,
//!     ];
//!     let stdout = std::io::stdout();
//!     let stdin = std::io::stdin();
//!     let mut seq = Sequencer::new(
//!         SerialConnector,
//!         Settings::default(),
//!         stdout.lock(),
//!         stdin.lock(),
//!     );
//!     seq.run(&actions)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;

// Re-exports for convenience
pub use crate::cli::{CliResult, ExitCodes};
pub use crate::config::AppConfig;
pub use crate::core::action::Action;
pub use crate::core::sequencer::{RunSummary, SequenceError, Sequencer, Settings};
pub use crate::core::transport::{
    BaudRate, Connector, MemoryConnector, MemoryLink, ReadOutcome, SerialConfig, SerialConnector,
    SerialLink, SerialTransport, TransportError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
