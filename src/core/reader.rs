//! Composite reads built on the byte primitives

use crate::core::transport::{ReadOutcome, SerialLink, TransportError};
use std::io::{self, BufReader, ErrorKind, Read};
use std::time::Duration;

/// Buffer size used by the receive-line action
pub const LINE_BUFFER_SIZE: usize = 256;

/// Byte buffer that refuses to grow past `max_len - 1` bytes
///
/// One slot of `max_len` stays reserved for a terminator, so a line read
/// into a `max_len` buffer carries at most `max_len - 1` payload bytes.
#[derive(Debug, Clone)]
pub struct BoundedBuffer {
    data: Vec<u8>,
    limit: usize,
}

impl BoundedBuffer {
    /// Create a buffer for a `max_len`-byte destination
    pub fn new(max_len: usize) -> Self {
        let limit = max_len.saturating_sub(1);
        Self {
            data: Vec::with_capacity(limit),
            limit,
        }
    }

    /// Append a byte; returns false when the buffer is already full
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.data.push(byte);
        true
    }

    /// Check if no more bytes fit
    pub fn is_full(&self) -> bool {
        self.data.len() >= self.limit
    }

    /// Collected bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Take ownership of the collected bytes
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

/// Why a line read stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    /// The delimiter arrived
    Delimiter,
    /// The buffer filled before the delimiter
    BufferFull,
    /// A byte did not arrive in time
    Timeout,
}

/// Result of [`read_until`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Received bytes, delimiter excluded
    pub bytes: Vec<u8>,
    /// How the read ended
    pub end: LineEnd,
}

impl Line {
    /// Received bytes as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Read until `delimiter`, a full buffer, or a per-byte timeout
///
/// `timeout` bounds the wait for each byte, not the whole call: a device that
/// keeps trickling bytes in just under the deadline keeps the read going
/// until the buffer fills.
pub fn read_until<L: SerialLink + ?Sized>(
    link: &mut L,
    delimiter: u8,
    max_len: usize,
    timeout: Duration,
) -> Result<Line, TransportError> {
    let mut buf = BoundedBuffer::new(max_len);

    let end = loop {
        if buf.is_full() {
            break LineEnd::BufferFull;
        }
        match link.read_byte(timeout)? {
            ReadOutcome::Byte(b) if b == delimiter => break LineEnd::Delimiter,
            ReadOutcome::Byte(b) => {
                buf.push(b);
            }
            ReadOutcome::Timeout => break LineEnd::Timeout,
        }
    };

    Ok(Line {
        bytes: buf.into_inner(),
        end,
    })
}

/// Result of reading one byte from a local file being streamed out
#[derive(Debug)]
pub enum SourceRead {
    /// A byte was read
    Byte(u8),
    /// The source is exhausted
    EndOfSource,
    /// The source failed
    Error(io::Error),
}

/// Buffered byte-at-a-time reader over a local file or any other source
pub struct ByteSource<R> {
    inner: BufReader<R>,
}

impl<R: Read> ByteSource<R> {
    /// Wrap a reader
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
        }
    }

    /// Read the next byte
    pub fn read_byte(&mut self) -> SourceRead {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return SourceRead::EndOfSource,
                Ok(_) => return SourceRead::Byte(buf[0]),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return SourceRead::Error(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::{Connector, MemoryConnector, MemoryLink, SerialConfig};

    const TIMEOUT: Duration = Duration::from_millis(50);

    fn open(link: &MemoryLink) -> MemoryLink {
        MemoryConnector::new(link.clone())
            .connect(&SerialConfig::new("mem", 9600).unwrap())
            .unwrap()
    }

    #[test]
    fn test_bounded_buffer_reserves_one_slot() {
        let mut buf = BoundedBuffer::new(3);
        assert!(buf.push(b'a'));
        assert!(buf.push(b'b'));
        assert!(!buf.push(b'c'));
        assert_eq!(buf.as_slice(), b"ab");

        let mut empty = BoundedBuffer::new(0);
        assert!(empty.is_full());
        assert!(!empty.push(b'a'));
    }

    #[test]
    fn test_stops_at_delimiter() {
        let link = MemoryLink::new();
        let mut handle = open(&link);
        link.feed(b"hello\nworld\n");

        let line = read_until(&mut handle, b'\n', LINE_BUFFER_SIZE, TIMEOUT).unwrap();
        assert_eq!(line.bytes, b"hello");
        assert_eq!(line.end, LineEnd::Delimiter);

        let line = read_until(&mut handle, b'\n', LINE_BUFFER_SIZE, TIMEOUT).unwrap();
        assert_eq!(line.text(), "world");
    }

    #[test]
    fn test_custom_delimiter() {
        let link = MemoryLink::new();
        let mut handle = open(&link);
        link.feed(b"OK\r\nrest");

        let line = read_until(&mut handle, b'\r', LINE_BUFFER_SIZE, TIMEOUT).unwrap();
        assert_eq!(line.bytes, b"OK");
    }

    #[test]
    fn test_timeout_returns_partial_line() {
        let link = MemoryLink::new();
        let mut handle = open(&link);
        link.feed(b"partial");

        let line = read_until(&mut handle, b'\n', LINE_BUFFER_SIZE, TIMEOUT).unwrap();
        assert_eq!(line.bytes, b"partial");
        assert_eq!(line.end, LineEnd::Timeout);
    }

    #[test]
    fn test_timeout_applies_per_byte() {
        let link = MemoryLink::new();
        let mut handle = open(&link);
        link.feed(b"ab");

        read_until(&mut handle, b'\n', LINE_BUFFER_SIZE, TIMEOUT).unwrap();
        assert_eq!(link.read_timeouts(), vec![TIMEOUT; 3]);
    }

    #[test]
    fn test_endless_source_is_bounded() {
        let link = MemoryLink::new();
        let mut handle = open(&link);
        link.endless(b'x');

        for max_len in [1, 2, 16, LINE_BUFFER_SIZE] {
            let line = read_until(&mut handle, b'\n', max_len, TIMEOUT).unwrap();
            assert_eq!(line.bytes.len(), max_len - 1);
            assert_eq!(line.end, LineEnd::BufferFull);
        }
    }

    #[test]
    fn test_zero_max_len_reads_nothing() {
        let link = MemoryLink::new();
        let mut handle = open(&link);
        link.feed(b"abc");

        let line = read_until(&mut handle, b'\n', 0, TIMEOUT).unwrap();
        assert!(line.bytes.is_empty());
        assert!(link.read_timeouts().is_empty());
    }

    #[test]
    fn test_closed_link_is_an_error() {
        let link = MemoryLink::new();
        let mut handle = open(&link);
        handle.close();
        assert!(matches!(
            read_until(&mut handle, b'\n', LINE_BUFFER_SIZE, TIMEOUT),
            Err(TransportError::Closed)
        ));
    }

    #[test]
    fn test_byte_source_outcomes() {
        let mut source = ByteSource::new(&b"ab"[..]);
        assert!(matches!(source.read_byte(), SourceRead::Byte(b'a')));
        assert!(matches!(source.read_byte(), SourceRead::Byte(b'b')));
        assert!(matches!(source.read_byte(), SourceRead::EndOfSource));
        assert!(matches!(source.read_byte(), SourceRead::EndOfSource));
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn test_byte_source_error() {
        let mut source = ByteSource::new(Failing);
        assert!(matches!(source.read_byte(), SourceRead::Error(_)));
    }
}
