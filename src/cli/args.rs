//! Command-line arguments
//!
//! Every action option may repeat and options run in the order they were
//! given, so the parsed values are merged back into one ordered list using
//! the argument indices clap records.

use crate::config::parse_eol_char;
use crate::core::action::Action;
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser, ValueHint};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

const ORDER_NOTE: &str = "\
Note: Order is important. Set '-b' baudrate before opening port '-p'.
      Used to make series of actions: '-d 2000 -s hello -d 100 -r'
      means 'wait 2secs, send 'hello', wait 100msec, get reply'";

/// uartctl command line
#[derive(Parser, Debug)]
#[command(
    name = "uartctl",
    version,
    about = "Send and receive bytes over a serial port, one action at a time",
    long_about = None,
    after_help = ORDER_NOTE
)]
pub struct Cli {
    /// Baudrate (bps) used by the following --port
    #[arg(short = 'b', long = "baud", value_name = "BPS", action = ArgAction::Append)]
    pub baud: Vec<u32>,

    /// Serial port to open (closes the previous one)
    #[arg(short = 'p', long = "port", value_name = "DEVICE", action = ArgAction::Append)]
    #[arg(value_hint = ValueHint::FilePath)]
    pub port: Vec<String>,

    /// Send string
    #[arg(short = 's', long = "send", value_name = "STRING", action = ArgAction::Append)]
    #[arg(allow_hyphen_values = true)]
    pub send: Vec<String>,

    /// Send string followed by a newline
    #[arg(short = 'S', long = "sendline", value_name = "STRING", action = ArgAction::Append)]
    #[arg(allow_hyphen_values = true)]
    pub sendline: Vec<String>,

    /// Send standard input line by line
    #[arg(short = 'i', long = "stdinput", action = ArgAction::Append)]
    #[arg(num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub stdinput: Vec<bool>,

    /// Send a number as a single byte
    #[arg(short = 'n', long = "num", value_name = "NUM", action = ArgAction::Append)]
    #[arg(allow_negative_numbers = true)]
    pub num: Vec<i64>,

    /// Send file as input
    #[arg(short = 'f', long = "ifile", visible_alias = "input", value_name = "FILE")]
    #[arg(action = ArgAction::Append, value_hint = ValueHint::FilePath)]
    pub ifile: Vec<PathBuf>,

    /// Save output to file
    #[arg(short = 'v', long = "ofile", visible_alias = "output", value_name = "FILE")]
    #[arg(action = ArgAction::Append, value_hint = ValueHint::FilePath)]
    pub ofile: Vec<PathBuf>,

    /// Receive single byte & print it out
    #[arg(short = 'y', long = "byte", action = ArgAction::Append)]
    #[arg(num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub byte: Vec<bool>,

    /// Receive string & print it out
    #[arg(short = 'r', long = "receive", action = ArgAction::Append)]
    #[arg(num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub receive: Vec<bool>,

    /// Flush serial port buffers for fresh reading
    #[arg(short = 'F', long = "flush", action = ArgAction::Append)]
    #[arg(num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub flush: Vec<bool>,

    /// Delay for specified milliseconds
    #[arg(short = 'd', long = "delay", value_name = "MILLIS", action = ArgAction::Append)]
    pub delay: Vec<u64>,

    /// End-of-line char for --receive (default '\n')
    #[arg(short = 'e', long = "eolchar", value_name = "CHAR", action = ArgAction::Append)]
    #[arg(value_parser = parse_eol_char, allow_hyphen_values = true)]
    pub eolchar: Vec<u8>,

    /// Timeout for reads in millisecs (default 5000)
    #[arg(short = 't', long = "timeout", value_name = "MILLIS", action = ArgAction::Append)]
    pub timeout: Vec<u64>,

    /// Don't print out as much info
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Print debug information
    #[arg(long = "verbose")]
    pub verbose: bool,

    /// Configuration file with defaults
    #[arg(long = "config", env = "UARTCTL_CONFIG", value_name = "FILE")]
    #[arg(value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// List available serial ports and exit
    #[arg(short = 'l', long = "list-ports")]
    pub list_ports: bool,
}

impl Cli {
    /// Parse the process arguments
    pub fn parse_with_actions() -> Result<(Self, Vec<Action>), clap::Error> {
        Self::try_parse_with_actions(std::env::args_os())
    }

    /// Parse `args` into options and the ordered action list
    pub fn try_parse_with_actions<I, T>(args: I) -> Result<(Self, Vec<Action>), clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        let cli = Self::from_arg_matches(&matches)?;
        let actions = cli.actions(&matches);
        Ok((cli, actions))
    }

    /// Print the help text
    pub fn print_help() -> std::io::Result<()> {
        Self::command().print_help()
    }

    fn actions(&self, matches: &ArgMatches) -> Vec<Action> {
        let mut ordered = Vec::new();
        let flag = |action: Action| move |set: &bool| set.then(|| action.clone());

        collect(&mut ordered, matches, "baud", &self.baud, |b| Some(Action::SetBaud(*b)));
        collect(&mut ordered, matches, "port", &self.port, |p| {
            Some(Action::OpenPort(p.clone()))
        });
        collect(&mut ordered, matches, "send", &self.send, |s| {
            Some(Action::SendString(s.clone()))
        });
        collect(&mut ordered, matches, "sendline", &self.sendline, |s| {
            Some(Action::SendLine(s.clone()))
        });
        collect(&mut ordered, matches, "stdinput", &self.stdinput, flag(Action::StdinRelay));
        collect(&mut ordered, matches, "num", &self.num, |n| Some(Action::SendNumber(*n)));
        collect(&mut ordered, matches, "ifile", &self.ifile, |f| {
            Some(Action::SendFile(f.clone()))
        });
        collect(&mut ordered, matches, "ofile", &self.ofile, |f| {
            Some(Action::SaveToFile(f.clone()))
        });
        collect(&mut ordered, matches, "byte", &self.byte, flag(Action::ReceiveByte));
        collect(&mut ordered, matches, "receive", &self.receive, flag(Action::ReceiveLine));
        collect(&mut ordered, matches, "flush", &self.flush, flag(Action::Flush));
        collect(&mut ordered, matches, "delay", &self.delay, |ms| {
            Some(Action::Delay(Duration::from_millis(*ms)))
        });
        collect(&mut ordered, matches, "eolchar", &self.eolchar, |e| Some(Action::SetEol(*e)));
        collect(&mut ordered, matches, "timeout", &self.timeout, |ms| {
            Some(Action::SetTimeout(Duration::from_millis(*ms)))
        });

        ordered.sort_by_key(|(index, _)| *index);
        ordered.into_iter().map(|(_, action)| action).collect()
    }
}

fn collect<T>(
    out: &mut Vec<(usize, Action)>,
    matches: &ArgMatches,
    id: &str,
    values: &[T],
    to_action: impl Fn(&T) -> Option<Action>,
) {
    let Some(indices) = matches.indices_of(id) else {
        return;
    };
    for (index, value) in indices.zip(values) {
        if let Some(action) = to_action(value) {
            out.push((index, action));
        }
    }
}
