//! Byte-at-a-time file transfers
//!
//! Both directions copy one byte per call and echo it to the console. After
//! every [`PACING_INTERVAL`] bytes the loop forces queued output out (drain
//! on the port, flush on the console and file) so that no more than one
//! interval of data sits in buffers on a slow consumer.

use crate::core::reader::{ByteSource, SourceRead};
use crate::core::transport::{ReadOutcome, SerialLink, TransportError};
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Bytes transferred between forced drains
///
/// Boundaries fall after bytes 60, 120, ...; there is no drain after the first byte.
pub const PACING_INTERVAL: u64 = 60;

/// How long save-to-file waits for each byte, including the first
pub const SAVE_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Transfer failures that end the whole run
#[derive(Error, Debug)]
pub enum TransferError {
    /// The port failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Echoing to the console failed
    #[error("Console write failed: {0}")]
    Console(#[source] io::Error),
}

/// How a transfer ended
#[derive(Debug)]
pub enum TransferEnd {
    /// Source exhausted, or the device went quiet after sending data
    Complete,
    /// Save-to-file saw no byte within the idle timeout
    NoInput,
    /// Reading the local file failed part way
    SourceFailed(io::Error),
    /// Writing the local file failed part way
    SinkFailed(io::Error),
}

/// Counters for one transfer
#[derive(Debug, Clone, Copy)]
pub struct TransferStats {
    bytes: u64,
    started: Instant,
}

impl TransferStats {
    /// Start counting now
    pub fn start() -> Self {
        Self {
            bytes: 0,
            started: Instant::now(),
        }
    }

    /// Count one byte; returns true on a pacing boundary
    pub fn record_byte(&mut self) -> bool {
        self.bytes += 1;
        self.bytes % PACING_INTERVAL == 0
    }

    /// Bytes counted so far
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Close the counters into a report
    pub fn finish(self, end: TransferEnd) -> TransferReport {
        TransferReport {
            bytes: self.bytes,
            elapsed: self.started.elapsed(),
            end,
        }
    }
}

/// Summary of a finished transfer
#[derive(Debug)]
pub struct TransferReport {
    /// Bytes transferred
    pub bytes: u64,
    /// Wall-clock duration
    pub elapsed: Duration,
    /// How the transfer ended
    pub end: TransferEnd,
}

impl TransferReport {
    /// Check if the transfer ended normally
    pub fn is_complete(&self) -> bool {
        matches!(self.end, TransferEnd::Complete)
    }
}

/// Stream `source` to the device one byte at a time
pub fn send_file<L, R, C>(
    link: &mut L,
    source: &mut ByteSource<R>,
    console: &mut C,
) -> Result<TransferReport, TransferError>
where
    L: SerialLink + ?Sized,
    R: Read,
    C: Write + ?Sized,
{
    link.flush()?;
    let mut stats = TransferStats::start();

    let end = loop {
        match source.read_byte() {
            SourceRead::Byte(b) => {
                link.write_byte(b)?;
                console.write_all(&[b]).map_err(TransferError::Console)?;
                if stats.record_byte() {
                    link.drain()?;
                    console.flush().map_err(TransferError::Console)?;
                }
            }
            SourceRead::EndOfSource => break TransferEnd::Complete,
            SourceRead::Error(e) => break TransferEnd::SourceFailed(e),
        }
    };

    if stats.bytes() > 0 {
        link.drain()?;
        console.flush().map_err(TransferError::Console)?;
    }
    Ok(stats.finish(end))
}

/// Copy device output into `sink` until the device stays quiet for `idle_timeout`
pub fn save_to_file<L, W, C>(
    link: &mut L,
    sink: &mut W,
    console: &mut C,
    idle_timeout: Duration,
) -> Result<TransferReport, TransferError>
where
    L: SerialLink + ?Sized,
    W: Write + ?Sized,
    C: Write + ?Sized,
{
    let mut stats = TransferStats::start();

    let mut next = match link.read_byte(idle_timeout)? {
        ReadOutcome::Byte(b) => Some(b),
        ReadOutcome::Timeout => return Ok(stats.finish(TransferEnd::NoInput)),
    };
    tracing::info!("Found input");

    while let Some(b) = next {
        if let Err(e) = sink.write_all(&[b]) {
            return Ok(stats.finish(TransferEnd::SinkFailed(e)));
        }
        console.write_all(&[b]).map_err(TransferError::Console)?;
        if stats.record_byte() {
            if let Err(e) = sink.flush() {
                return Ok(stats.finish(TransferEnd::SinkFailed(e)));
            }
            console.flush().map_err(TransferError::Console)?;
        }
        next = link.read_byte(idle_timeout)?.byte();
    }

    if let Err(e) = sink.flush() {
        return Ok(stats.finish(TransferEnd::SinkFailed(e)));
    }
    console.flush().map_err(TransferError::Console)?;
    Ok(stats.finish(TransferEnd::Complete))
}
