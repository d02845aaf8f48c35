//! Action sequencer
//!
//! Executes a list of [`Action`]s strictly left to right against at most one
//! open port. Fatal errors stop the run and come back as [`SequenceError`];
//! local failures (missing input file, read timeout) are logged and the run
//! moves on to the next action.

use crate::core::action::Action;
use crate::core::reader::{read_until, ByteSource, LineEnd, LINE_BUFFER_SIZE};
use crate::core::transfer::{self, TransferEnd, TransferError, SAVE_IDLE_TIMEOUT};
use crate::core::transport::{Connector, ReadOutcome, SerialConfig, SerialLink, TransportError};
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default read timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default end-of-line byte
pub const DEFAULT_EOL: u8 = b'\n';

/// Errors that end a run
#[derive(Error, Debug)]
pub enum SequenceError {
    /// An action needed a port before any was opened
    #[error("serial port not opened (required by '{action}')")]
    PortNotOpen {
        /// The action that needed the port
        action: String,
    },

    /// Baud rate outside the supported table
    #[error("unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),

    /// The device could not be opened
    #[error("couldn't open port: {0}")]
    Open(#[source] TransportError),

    /// A write did not complete
    #[error("error writing: {0}")]
    Write(#[source] TransportError),

    /// The device failed while reading
    #[error("error reading: {0}")]
    Read(#[source] TransportError),

    /// Any other port failure
    #[error("port error: {0}")]
    Transport(#[source] TransportError),

    /// Writing to the console failed
    #[error("console output failed: {0}")]
    Console(#[source] io::Error),

    /// Reading standard input failed
    #[error("reading standard input failed: {0}")]
    Stdin(#[source] io::Error),
}

impl From<TransportError> for SequenceError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::UnsupportedBaudRate(bps) => Self::UnsupportedBaudRate(bps),
            TransportError::Write(_) => Self::Write(err),
            TransportError::Read(_) => Self::Read(err),
            _ => Self::Transport(err),
        }
    }
}

impl From<TransferError> for SequenceError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Transport(e) => e.into(),
            TransferError::Console(e) => Self::Console(e),
        }
    }
}

/// Values that actions update and later actions read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Baud rate applied at the next open
    pub baud: u32,
    /// Per-byte read timeout
    pub timeout: Duration,
    /// Delimiter for line reads
    pub eol: u8,
    /// Suppress labels on printed data
    pub quiet: bool,
    /// Idle timeout for save-to-file
    pub save_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            baud: 9600,
            timeout: DEFAULT_TIMEOUT,
            eol: DEFAULT_EOL,
            quiet: false,
            save_timeout: SAVE_IDLE_TIMEOUT,
        }
    }
}

/// The currently open device
#[derive(Debug)]
pub struct OpenPort<L> {
    /// Path it was opened with
    pub path: String,
    /// The link itself
    pub link: L,
}

/// Everything a run carries from one action to the next
#[derive(Debug)]
pub struct SequencerState<L> {
    /// The open port, if any
    pub port: Option<OpenPort<L>>,
    /// Current settings
    pub settings: Settings,
}

impl<L> SequencerState<L> {
    /// Fresh state with no port open
    pub fn new(settings: Settings) -> Self {
        Self {
            port: None,
            settings,
        }
    }
}

/// Whether a port is currently open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No port has been opened yet
    NoPortOpen,
    /// A port is open
    PortOpen,
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of actions executed
    pub actions_executed: usize,
}

/// Runs actions against a port opened through `C`
pub struct Sequencer<C: Connector, O, I> {
    connector: C,
    state: SequencerState<C::Link>,
    console: O,
    input: I,
}

impl<C, O, I> Sequencer<C, O, I>
where
    C: Connector,
    O: Write,
    I: BufRead,
{
    /// Create a sequencer printing to `console` and relaying from `input`
    pub fn new(connector: C, settings: Settings, console: O, input: I) -> Self {
        Self {
            connector,
            state: SequencerState::new(settings),
            console,
            input,
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        if self.state.port.is_some() {
            Phase::PortOpen
        } else {
            Phase::NoPortOpen
        }
    }

    /// Current state
    pub fn state(&self) -> &SequencerState<C::Link> {
        &self.state
    }

    /// Console sink
    pub fn console(&self) -> &O {
        &self.console
    }

    /// Run every action in order, stopping at the first fatal error
    ///
    /// The port is closed when the run ends, successfully or not.
    pub fn run<'a, A>(&mut self, actions: A) -> Result<RunSummary, SequenceError>
    where
        A: IntoIterator<Item = &'a Action>,
    {
        let mut executed = 0;
        let result = actions.into_iter().try_for_each(|action| -> Result<(), SequenceError> {
            self.execute(action)?;
            executed += 1;
            Ok(())
        });
        self.close_port();
        result.map(|()| RunSummary {
            actions_executed: executed,
        })
    }

    /// Execute one action
    pub fn execute(&mut self, action: &Action) -> Result<(), SequenceError> {
        debug!("Executing: {}", action);
        let settings = &mut self.state.settings;

        match action {
            Action::SetBaud(bps) => {
                settings.baud = *bps;
                info!("baud rate set to {}", bps);
            }
            Action::SetTimeout(timeout) => {
                settings.timeout = *timeout;
                info!("timeout set to {} millisecs", timeout.as_millis());
            }
            Action::SetEol(eol) => {
                settings.eol = *eol;
                info!("eolchar set to {:?}", char::from(*eol));
            }
            Action::Delay(duration) => {
                info!("sleep {} millisecs", duration.as_millis());
                std::thread::sleep(*duration);
            }
            Action::OpenPort(path) => self.open_port(path)?,
            _ => {
                let Some(port) = self.state.port.as_mut() else {
                    return Err(SequenceError::PortNotOpen {
                        action: action.to_string(),
                    });
                };
                run_port_action(
                    &mut port.link,
                    &self.state.settings,
                    &mut self.console,
                    &mut self.input,
                    action,
                )?;
            }
        }
        Ok(())
    }

    fn open_port(&mut self, path: &str) -> Result<(), SequenceError> {
        self.close_port();

        let config = SerialConfig::new(path, self.state.settings.baud)?;
        let link = self.connector.connect(&config).map_err(SequenceError::Open)?;
        info!("opened port {} @ {}", path, config.baud_rate);

        self.state.port = Some(OpenPort {
            path: path.to_string(),
            link,
        });
        Ok(())
    }

    fn close_port(&mut self) {
        if let Some(mut port) = self.state.port.take() {
            port.link.close();
            info!("closed port {}", port.path);
        }
    }
}

fn run_port_action<L, O, I>(
    link: &mut L,
    settings: &Settings,
    console: &mut O,
    input: &mut I,
    action: &Action,
) -> Result<(), SequenceError>
where
    L: SerialLink,
    O: Write,
    I: BufRead,
{
    match action {
        Action::SendString(text) => {
            info!("send string:{}", text);
            link.write_buffer(text.as_bytes())?;
        }
        Action::SendLine(text) => {
            let mut data = Vec::with_capacity(text.len() + 1);
            data.extend_from_slice(text.as_bytes());
            data.push(b'\n');
            info!("send string:{}", String::from_utf8_lossy(&data));
            link.write_buffer(&data)?;
        }
        Action::StdinRelay => relay_stdin(link, input)?,
        Action::SendNumber(n) => {
            let byte = n.to_le_bytes()[0];
            info!("send number {} as byte 0x{:02x}", n, byte);
            link.write_byte(byte)?;
        }
        Action::SendFile(path) => {
            let file = match File::open(path) {
                Ok(file) => file,
                Err(e) => {
                    warn!("error opening input file {}: {}", path.display(), e);
                    return Ok(());
                }
            };
            info!("opened file \"{}\"", path.display());

            let report = transfer::send_file(link, &mut ByteSource::new(file), console)?;
            writeln!(console).map_err(SequenceError::Console)?;
            if let TransferEnd::SourceFailed(e) = &report.end {
                warn!("input loop broke unexpectedly: {}", e);
            }
            info!(
                "completed file read/input ({} bytes) ({:.2} seconds)",
                report.bytes,
                report.elapsed.as_secs_f64()
            );
        }
        Action::SaveToFile(path) => {
            let file = match File::create(path) {
                Ok(file) => file,
                Err(e) => {
                    warn!("error opening output file {}: {}", path.display(), e);
                    return Ok(());
                }
            };
            info!("opened file \"{}\"", path.display());
            info!(
                "waiting up to {} seconds for input",
                settings.save_timeout.as_secs()
            );

            let mut sink = BufWriter::new(file);
            let report = transfer::save_to_file(link, &mut sink, console, settings.save_timeout)?;
            match &report.end {
                TransferEnd::NoInput => warn!("no input found"),
                TransferEnd::SinkFailed(e) => {
                    warn!("error writing output file {}: {}", path.display(), e);
                }
                TransferEnd::Complete | TransferEnd::SourceFailed(_) => {
                    writeln!(console).map_err(SequenceError::Console)?;
                    info!(
                        "completed file save ({} bytes) ({:.2} seconds)",
                        report.bytes,
                        report.elapsed.as_secs_f64()
                    );
                }
            }
        }
        Action::ReceiveByte => {
            match link.read_byte(settings.timeout)? {
                ReadOutcome::Byte(b) => {
                    if !settings.quiet {
                        write!(console, "read byte:").map_err(SequenceError::Console)?;
                    }
                    writeln!(console, "0x{b:02x}").map_err(SequenceError::Console)?;
                }
                ReadOutcome::Timeout => {
                    warn!("no byte received within {} millisecs", settings.timeout.as_millis());
                    if !settings.quiet {
                        write!(console, "read byte:").map_err(SequenceError::Console)?;
                    }
                    writeln!(console, "0x00").map_err(SequenceError::Console)?;
                }
            }
            console.flush().map_err(SequenceError::Console)?;
        }
        Action::ReceiveLine => {
            let line = read_until(link, settings.eol, LINE_BUFFER_SIZE, settings.timeout)?;
            match line.end {
                LineEnd::Timeout if line.bytes.is_empty() => {
                    warn!("no line received within {} millisecs", settings.timeout.as_millis());
                }
                LineEnd::BufferFull => {
                    debug!("line truncated at {} bytes", line.bytes.len());
                }
                _ => {}
            }
            if !settings.quiet {
                write!(console, "read string:").map_err(SequenceError::Console)?;
            }
            console
                .write_all(&line.bytes)
                .and_then(|()| writeln!(console))
                .and_then(|()| console.flush())
                .map_err(SequenceError::Console)?;
        }
        Action::Flush => {
            info!("flushing receive buffer");
            link.flush()?;
        }
        Action::SetBaud(_)
        | Action::SetTimeout(_)
        | Action::SetEol(_)
        | Action::OpenPort(_)
        | Action::Delay(_) => {}
    }
    Ok(())
}

fn relay_stdin<L, I>(link: &mut L, input: &mut I) -> Result<(), SequenceError>
where
    L: SerialLink,
    I: BufRead,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        if input.read_until(b'\n', &mut line).map_err(SequenceError::Stdin)? == 0 {
            return Ok(());
        }
        info!("send string:{}", String::from_utf8_lossy(&line));
        link.write_buffer(&line)?;
    }
}
