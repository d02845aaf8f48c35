//! CLI Module
//!
//! Provides command-line interface functionality including:
//! - Argument parsing into an ordered action list
//! - Exit codes for automation

pub mod args;
pub mod exit_codes;

pub use args::Cli;
pub use exit_codes::{CliResult, ExitCodes};
