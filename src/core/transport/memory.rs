//! In-memory loopback transport
//!
//! Stands in for a device when no hardware is attached. Bytes fed with
//! [`MemoryLink::feed`] arrive later as device output; with echo enabled
//! every written byte is looped back into the receive buffer.

use super::{Connector, ReadOutcome, SerialConfig, SerialLink, TransportError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct MemoryState {
    /// Bytes already sitting in the receive buffer (discarded by flush)
    rx_buffer: VecDeque<u8>,
    /// Bytes the device has yet to send
    script: VecDeque<u8>,
    /// Produced forever once everything else is consumed
    endless: Option<u8>,
    echo: bool,
    fail_writes: bool,
    written: Vec<u8>,
    drains: Vec<usize>,
    flushes: usize,
    read_timeouts: Vec<Duration>,
    open_handles: usize,
    max_open_handles: usize,
    opened: Vec<SerialConfig>,
}

/// Handle onto a shared in-memory line
#[derive(Debug, Default)]
pub struct MemoryLink {
    state: Arc<Mutex<MemoryState>>,
    open: bool,
}

/// Clones share the line but start closed; only the connector opens handles.
impl Clone for MemoryLink {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            open: false,
        }
    }
}

impl MemoryLink {
    /// Create a link with nothing queued
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a link that loops written bytes back as input
    pub fn echo() -> Self {
        let link = Self::new();
        link.state.lock().echo = true;
        link
    }

    /// Queue bytes the device will send
    pub fn feed(&self, data: &[u8]) {
        self.state.lock().script.extend(data);
    }

    /// Produce `byte` forever once queued input runs out
    pub fn endless(&self, byte: u8) {
        self.state.lock().endless = Some(byte);
    }

    /// Make every subsequent write fail
    pub fn fail_writes(&self) {
        self.state.lock().fail_writes = true;
    }

    /// Everything written so far
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().written.clone()
    }

    /// Total bytes written at the moment of each drain
    pub fn drains(&self) -> Vec<usize> {
        self.state.lock().drains.clone()
    }

    /// Number of flush calls
    pub fn flushes(&self) -> usize {
        self.state.lock().flushes
    }

    /// Timeouts passed to each read, in order
    pub fn read_timeouts(&self) -> Vec<Duration> {
        self.state.lock().read_timeouts.clone()
    }

    /// Largest number of simultaneously open handles seen
    pub fn max_open_handles(&self) -> usize {
        self.state.lock().max_open_handles
    }

    /// Configurations passed to [`MemoryConnector::connect`], in order
    pub fn opened(&self) -> Vec<SerialConfig> {
        self.state.lock().opened.clone()
    }

    fn open_handle(&self, config: &SerialConfig) -> Self {
        let mut state = self.state.lock();
        state.open_handles += 1;
        state.max_open_handles = state.max_open_handles.max(state.open_handles);
        state.opened.push(config.clone());
        Self {
            state: Arc::clone(&self.state),
            open: true,
        }
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.open {
            Ok(())
        } else {
            Err(TransportError::Closed)
        }
    }

    fn push_written(&self, data: &[u8]) -> Result<usize, TransportError> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(TransportError::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "link refused write",
            )));
        }
        state.written.extend_from_slice(data);
        if state.echo {
            state.rx_buffer.extend(data);
        }
        Ok(data.len())
    }
}

impl SerialLink for MemoryLink {
    fn write_byte(&mut self, byte: u8) -> Result<usize, TransportError> {
        self.push_written(&[byte])
    }

    fn write_buffer(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        self.push_written(data)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        state.rx_buffer.clear();
        state.flushes += 1;
        Ok(())
    }

    fn drain(&mut self) -> Result<(), TransportError> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        let total = state.written.len();
        state.drains.push(total);
        Ok(())
    }

    fn read_byte(&mut self, timeout: Duration) -> Result<ReadOutcome, TransportError> {
        self.ensure_open()?;
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.read_timeouts.push(timeout);
        let next = state
            .rx_buffer
            .pop_front()
            .or_else(|| state.script.pop_front())
            .or(state.endless);
        Ok(next.map_or(ReadOutcome::Timeout, ReadOutcome::Byte))
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.state.lock().open_handles -= 1;
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl Drop for MemoryLink {
    fn drop(&mut self) {
        self.close();
    }
}

/// Hands out handles onto one shared [`MemoryLink`]
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    link: MemoryLink,
    rejected: Vec<String>,
}

impl MemoryConnector {
    /// Connector whose every open lands on `link`
    pub fn new(link: MemoryLink) -> Self {
        Self {
            link,
            rejected: Vec::new(),
        }
    }

    /// Make opening `path` fail as if the device did not exist
    #[must_use]
    pub fn reject(mut self, path: &str) -> Self {
        self.rejected.push(path.to_string());
        self
    }
}

impl Connector for MemoryConnector {
    type Link = MemoryLink;

    fn connect(&mut self, config: &SerialConfig) -> Result<Self::Link, TransportError> {
        if self.rejected.iter().any(|p| *p == config.port) {
            return Err(TransportError::PortNotFound(config.port.clone()));
        }
        let mut link = self.link.open_handle(config);
        link.flush()?;
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(link: &MemoryLink) -> MemoryLink {
        MemoryConnector::new(link.clone())
            .connect(&SerialConfig::new("mem", 9600).unwrap())
            .unwrap()
    }

    #[test]
    fn test_echo_loops_writes_back() {
        let link = MemoryLink::echo();
        let mut handle = open(&link);
        handle.write_buffer(b"ok").unwrap();
        assert_eq!(handle.read_byte(Duration::ZERO).unwrap(), ReadOutcome::Byte(b'o'));
        assert_eq!(handle.read_byte(Duration::ZERO).unwrap(), ReadOutcome::Byte(b'k'));
        assert_eq!(handle.read_byte(Duration::ZERO).unwrap(), ReadOutcome::Timeout);
    }

    #[test]
    fn test_flush_discards_buffered_input_only() {
        let link = MemoryLink::echo();
        let mut handle = open(&link);
        link.feed(b"later");
        handle.write_buffer(b"stale").unwrap();
        handle.flush().unwrap();
        assert_eq!(handle.read_byte(Duration::ZERO).unwrap(), ReadOutcome::Byte(b'l'));
    }

    #[test]
    fn test_closed_handle_rejects_io() {
        let link = MemoryLink::new();
        let mut handle = open(&link);
        handle.close();
        handle.close();
        assert!(!handle.is_open());
        assert!(matches!(handle.write_byte(1), Err(TransportError::Closed)));
        assert!(matches!(handle.read_byte(Duration::ZERO), Err(TransportError::Closed)));
        assert_eq!(link.max_open_handles(), 1);
    }

    #[test]
    fn test_rejected_path() {
        let mut connector = MemoryConnector::new(MemoryLink::new()).reject("/dev/missing");
        let config = SerialConfig::new("/dev/missing", 9600).unwrap();
        assert!(matches!(
            connector.connect(&config),
            Err(TransportError::PortNotFound(_))
        ));
    }
}
