//! Serial port transport implementation

use super::{BaudRate, Connector, ReadOutcome, SerialLink, TransportError};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

/// Deadline for a single blocked write before it counts as a failure
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Serial port configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Port name (e.g., /dev/ttyUSB0, COM3)
    pub port: String,
    /// Baud rate
    pub baud_rate: BaudRate,
}

impl SerialConfig {
    /// Validate `baud_rate` against the supported table
    pub fn new(port: &str, baud_rate: u32) -> Result<Self, TransportError> {
        Ok(Self {
            port: port.to_string(),
            baud_rate: BaudRate::new(baud_rate)?,
        })
    }
}

/// Serial port transport
pub struct SerialTransport {
    name: String,
    port: Option<Box<dyn SerialPort>>,
    timeout: Duration,
}

impl SerialTransport {
    /// Open the device in raw 8-N-1 mode and discard anything already buffered
    pub fn open(config: &SerialConfig) -> Result<Self, TransportError> {
        let port = serialport::new(&config.port, config.baud_rate.bps())
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => TransportError::PortNotFound(config.port.clone()),
                serialport::ErrorKind::Io(ErrorKind::NotFound) => {
                    TransportError::PortNotFound(config.port.clone())
                }
                serialport::ErrorKind::Io(ErrorKind::PermissionDenied) => {
                    TransportError::PermissionDenied(config.port.clone())
                }
                _ => TransportError::OpenFailed {
                    path: config.port.clone(),
                    reason: e.to_string(),
                },
            })?;

        let mut transport = Self::from_port(config.port.clone(), port);
        transport.flush()?;

        tracing::debug!("Configured {} @ {} (8N1, raw)", config.port, config.baud_rate);
        Ok(transport)
    }

    /// Wrap an already configured port
    pub fn from_port(name: String, port: Box<dyn SerialPort>) -> Self {
        let timeout = port.timeout();
        Self {
            name,
            port: Some(port),
            timeout,
        }
    }

    /// Device name this transport was opened with
    pub fn name(&self) -> &str {
        &self.name
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::Closed)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), TransportError> {
        if self.timeout != timeout {
            self.port()?
                .set_timeout(timeout)
                .map_err(|e| TransportError::Control(e.to_string()))?;
            self.timeout = timeout;
        }
        Ok(())
    }
}

impl SerialLink for SerialTransport {
    fn write_byte(&mut self, byte: u8) -> Result<usize, TransportError> {
        self.set_timeout(WRITE_TIMEOUT)?;
        let port = self.port()?;
        loop {
            match port.write(&[byte]) {
                Ok(0) => return Err(TransportError::short_write()),
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(TransportError::Write(e)),
            }
        }
    }

    fn write_buffer(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        self.set_timeout(WRITE_TIMEOUT)?;
        let port = self.port()?;
        let mut remaining = data;
        while !remaining.is_empty() {
            match port.write(remaining) {
                Ok(0) => return Err(TransportError::short_write()),
                Ok(n) => remaining = &remaining[n..],
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(TransportError::Write(e)),
            }
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.port()?
            .clear(ClearBuffer::All)
            .map_err(|e| TransportError::Control(e.to_string()))
    }

    fn drain(&mut self) -> Result<(), TransportError> {
        self.port()?
            .flush()
            .map_err(|e| TransportError::Control(e.to_string()))
    }

    fn read_byte(&mut self, timeout: Duration) -> Result<ReadOutcome, TransportError> {
        self.set_timeout(timeout)?;
        let port = self.port()?;
        let mut buf = [0u8; 1];
        loop {
            let result = port.read(&mut buf);
            if let Some(outcome) = read_outcome(result, buf[0]) {
                return outcome;
            }
        }
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::debug!("Closed {}", self.name);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

/// Classify one `read` call; `None` means retry
///
/// A zero-length read is end of file (the line hung up), not a timeout.
fn read_outcome(
    result: std::io::Result<usize>,
    byte: u8,
) -> Option<Result<ReadOutcome, TransportError>> {
    match result {
        Ok(0) => Some(Err(TransportError::Read(ErrorKind::UnexpectedEof.into()))),
        Ok(_) => Some(Ok(ReadOutcome::Byte(byte))),
        Err(e) if e.kind() == ErrorKind::TimedOut => Some(Ok(ReadOutcome::Timeout)),
        Err(e) if e.kind() == ErrorKind::Interrupted => None,
        Err(e) => Some(Err(TransportError::Read(e))),
    }
}

/// Opens real devices through the `serialport` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    type Link = SerialTransport;

    fn connect(&mut self, config: &SerialConfig) -> Result<Self::Link, TransportError> {
        SerialTransport::open(config)
    }
}

/// List available serial ports
pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>, TransportError> {
    serialport::available_ports().map_err(|e| TransportError::Control(e.to_string()))
}
