//! End-to-end runs against the in-memory link

use std::io::Cursor;
use std::time::Duration;
use uartctl_core::cli::{Cli, CliResult, ExitCodes};
use uartctl_core::core::reader::{read_until, ByteSource, LineEnd, LINE_BUFFER_SIZE};
use uartctl_core::core::transfer::{send_file, TransferEnd};
use uartctl_core::core::transport::SUPPORTED_BAUD_RATES;
use uartctl_core::{
    Action, Connector, MemoryConnector, MemoryLink, ReadOutcome, SequenceError, Sequencer,
    SerialConfig, SerialLink, Settings,
};

type MemorySequencer = Sequencer<MemoryConnector, Vec<u8>, Cursor<Vec<u8>>>;

fn sequencer(link: &MemoryLink, stdin: &str) -> MemorySequencer {
    let settings = Settings {
        save_timeout: Duration::from_millis(10),
        ..Settings::default()
    };
    Sequencer::new(
        MemoryConnector::new(link.clone()),
        settings,
        Vec::new(),
        Cursor::new(stdin.as_bytes().to_vec()),
    )
}

fn open(link: &MemoryLink, bps: u32) -> MemoryLink {
    let config = SerialConfig::new("mem", bps).unwrap();
    MemoryConnector::new(link.clone()).connect(&config).unwrap()
}

fn parse(args: &[&str]) -> Vec<Action> {
    let argv = std::iter::once("uartctl").chain(args.iter().copied());
    Cli::try_parse_with_actions(argv).unwrap().1
}

#[test]
fn idle_port_times_out_at_every_supported_rate() {
    for &bps in SUPPORTED_BAUD_RATES {
        let link = MemoryLink::new();
        let mut port = open(&link, bps);
        let outcome = port.read_byte(Duration::ZERO).unwrap();
        assert_eq!(outcome, ReadOutcome::Timeout, "{bps} baud");
    }
}

#[test]
fn loopback_line_round_trip() {
    let link = MemoryLink::echo();
    let mut port = open(&link, 115_200);

    port.write_buffer(b"AT+GMR;").unwrap();
    let line = read_until(&mut port, b';', LINE_BUFFER_SIZE, Duration::from_millis(50)).unwrap();

    assert_eq!(line.bytes, b"AT+GMR");
    assert_eq!(line.end, LineEnd::Delimiter);
}

#[test]
fn endless_input_is_bounded_by_buffer() {
    let link = MemoryLink::new();
    link.endless(b'U');
    let mut port = open(&link, 9600);

    let line = read_until(&mut port, b'\n', 16, Duration::from_millis(50)).unwrap();

    assert_eq!(line.bytes.len(), 15);
    assert_eq!(line.end, LineEnd::BufferFull);
}

#[test]
fn empty_file_sends_nothing() {
    let link = MemoryLink::new();
    let mut port = open(&link, 9600);
    let mut console = Vec::new();

    let report = send_file(&mut port, &mut ByteSource::new(Cursor::new(Vec::new())), &mut console)
        .unwrap();

    assert_eq!(report.bytes, 0);
    assert!(matches!(report.end, TransferEnd::Complete));
    assert!(link.written().is_empty());
    assert!(link.drains().is_empty());
    assert!(console.is_empty());
}

#[test]
fn save_without_input_creates_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.bin");
    let link = MemoryLink::new();
    let mut seq = sequencer(&link, "");

    seq.run(&[Action::OpenPort("X".into()), Action::SaveToFile(path.clone())])
        .unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), b"");
}

#[test]
fn reopen_closes_previous_handle_first() {
    let link = MemoryLink::new();
    let mut seq = sequencer(&link, "");

    seq.run(&[
        Action::OpenPort("A".into()),
        Action::SetBaud(115_200),
        Action::OpenPort("B".into()),
    ])
    .unwrap();

    assert_eq!(link.max_open_handles(), 1);
    let opened = link.opened();
    assert_eq!(opened.len(), 2);
    assert_eq!(opened[0].port, "A");
    assert_eq!(opened[1].baud_rate.bps(), 115_200);
}

#[test]
fn echo_scenario_from_command_line() {
    let link = MemoryLink::echo();
    let mut seq = sequencer(&link, "");
    let actions = parse(&["-b", "9600", "-p", "X", "-S", "hello", "-r"]);

    let summary = seq.run(&actions).unwrap();

    assert_eq!(summary.actions_executed, 4);
    assert_eq!(String::from_utf8_lossy(seq.console()), "read string:hello\n");
}

#[test]
fn send_without_port_exits_with_port_not_open() {
    let link = MemoryLink::new();
    let mut seq = sequencer(&link, "");

    let err = seq.run(&parse(&["-s", "x"])).unwrap_err();

    assert!(matches!(err, SequenceError::PortNotOpen { .. }));
    assert!(link.written().is_empty());
    assert_eq!(CliResult::from(err).code(), ExitCodes::PORT_NOT_OPEN);
}

#[test]
fn unsupported_baud_fails_at_open() {
    let link = MemoryLink::new();
    let mut seq = sequencer(&link, "");

    let err = seq.run(&parse(&["-b", "12345", "-p", "X"])).unwrap_err();

    assert!(matches!(err, SequenceError::UnsupportedBaudRate(12345)));
    assert!(link.opened().is_empty());
    assert_eq!(CliResult::from(err).code(), ExitCodes::UNSUPPORTED_BAUD);
}

#[test]
fn stdin_relay_and_quiet_byte_read() {
    let link = MemoryLink::new();
    link.feed(b"\x2a");
    let mut seq = Sequencer::new(
        MemoryConnector::new(link.clone()),
        Settings {
            quiet: true,
            ..Settings::default()
        },
        Vec::new(),
        Cursor::new(b"one\ntwo".to_vec()),
    );

    seq.run(&parse(&["-p", "X", "-y", "-i", "-n", "300"])).unwrap();

    assert_eq!(String::from_utf8_lossy(seq.console()), "0x2a\n");
    assert_eq!(link.written(), b"one\ntwo\x2c");
}

#[test]
fn eolchar_only_changes_line_reads() {
    let link = MemoryLink::new();
    link.feed(b"ok;");
    let mut seq = sequencer(&link, "");

    seq.run(&parse(&["-p", "X", "-e", ";", "-S", "hello", "-r"]))
        .unwrap();

    assert_eq!(link.written(), b"hello\n");
    assert_eq!(String::from_utf8_lossy(seq.console()), "read string:ok\n");
}

#[test]
fn every_byte_read_prints_one_line() {
    let link = MemoryLink::new();
    let mut seq = sequencer(&link, "");

    seq.run(&parse(&["-p", "X", "-y", "-r"])).unwrap();

    assert_eq!(
        String::from_utf8_lossy(seq.console()),
        "read byte:0x00\nread string:\n"
    );
}
