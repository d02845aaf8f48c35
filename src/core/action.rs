//! Steps of a run, in command-line order

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One step of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Baud rate for the next open
    SetBaud(u32),
    /// Read timeout for subsequent receives
    SetTimeout(Duration),
    /// Delimiter for subsequent line reads
    SetEol(u8),
    /// Open a device, closing the current one first
    OpenPort(String),
    /// Send a string verbatim
    SendString(String),
    /// Send a string followed by a newline
    SendLine(String),
    /// Relay standard input line by line
    StdinRelay,
    /// Send the low byte of a number
    SendNumber(i64),
    /// Stream a local file to the device
    SendFile(PathBuf),
    /// Save device output to a local file
    SaveToFile(PathBuf),
    /// Receive one byte and print it as hex
    ReceiveByte,
    /// Receive a delimited line and print it
    ReceiveLine,
    /// Discard buffered input and output
    Flush,
    /// Sleep
    Delay(Duration),
}

impl Action {
    /// Check if the action needs an open port
    pub fn requires_port(&self) -> bool {
        !matches!(
            self,
            Self::SetBaud(_) | Self::SetTimeout(_) | Self::SetEol(_) | Self::OpenPort(_) | Self::Delay(_)
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetBaud(bps) => write!(f, "set baud {bps}"),
            Self::SetTimeout(t) => write!(f, "set timeout {}ms", t.as_millis()),
            Self::SetEol(b) => write!(f, "set eol 0x{b:02x}"),
            Self::OpenPort(path) => write!(f, "open {path}"),
            Self::SendString(_) => write!(f, "send"),
            Self::SendLine(_) => write!(f, "sendline"),
            Self::StdinRelay => write!(f, "stdin"),
            Self::SendNumber(n) => write!(f, "send number {n}"),
            Self::SendFile(path) => write!(f, "send file {}", path.display()),
            Self::SaveToFile(path) => write!(f, "save to {}", path.display()),
            Self::ReceiveByte => write!(f, "receive byte"),
            Self::ReceiveLine => write!(f, "receive line"),
            Self::Flush => write!(f, "flush"),
            Self::Delay(t) => write!(f, "delay {}ms", t.as_millis()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_port() {
        assert!(!Action::SetBaud(9600).requires_port());
        assert!(!Action::OpenPort("/dev/ttyUSB0".into()).requires_port());
        assert!(!Action::Delay(Duration::from_millis(10)).requires_port());
        assert!(Action::SendString("x".into()).requires_port());
        assert!(Action::Flush.requires_port());
        assert!(Action::SaveToFile("out.bin".into()).requires_port());
    }

    #[test]
    fn test_display() {
        assert_eq!(Action::SetEol(b'\r').to_string(), "set eol 0x0d");
        assert_eq!(Action::Delay(Duration::from_millis(250)).to_string(), "delay 250ms");
    }
}
