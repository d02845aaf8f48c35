//! Core functionality
//!
//! - [`transport`]: the serial link abstraction and its real and in-memory backends
//! - [`reader`]: delimiter-bounded reads and local byte sources
//! - [`transfer`]: paced file upload and idle-bounded capture
//! - [`action`] and [`sequencer`]: the ordered action list and its executor

pub mod action;
pub mod reader;
pub mod sequencer;
pub mod transfer;
pub mod transport;
