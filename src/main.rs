//! uartctl - scripted serial port conversations
//!
//! Options are executed in command-line order:
//! `uartctl -b 115200 -p /dev/ttyACM0 -S AT -r`

use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use uartctl_core::cli::{Cli, CliResult, ExitCodes};
use uartctl_core::config::AppConfig;
use uartctl_core::core::sequencer::Sequencer;
use uartctl_core::core::transport::{list_ports, SerialConnector};

fn main() -> ExitCode {
    if std::env::args_os().len() <= 1 {
        return match Cli::print_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::from(ExitCodes::ERROR),
        };
    }

    let (cli, actions) = match Cli::parse_with_actions() {
        Ok(parsed) => parsed,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(ExitCodes::INVALID_ARGS)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let result = run(&cli, &actions);
    if let CliResult::Error(_, msg) = &result {
        eprintln!("error: {msg}");
    }
    result.to_exit_code()
}

fn run(cli: &Cli, actions: &[uartctl_core::Action]) -> CliResult {
    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return e.into(),
    };

    let quiet = cli.quiet || config.defaults.quiet;
    if let Err(e) = init_logging(&config, quiet, cli.verbose) {
        return CliResult::error(ExitCodes::CONFIG_ERROR, e.to_string());
    }
    tracing::debug!("Starting uartctl v{}", env!("CARGO_PKG_VERSION"));

    if cli.list_ports {
        return match print_ports() {
            Ok(()) => CliResult::success(),
            Err(e) => CliResult::error(ExitCodes::ERROR, e.to_string()),
        };
    }

    let mut settings = match config.settings() {
        Ok(settings) => settings,
        Err(e) => return e.into(),
    };
    settings.quiet = quiet;

    let stdout = std::io::stdout();
    let stdin = std::io::stdin();
    let mut sequencer = Sequencer::new(SerialConnector, settings, stdout.lock(), stdin.lock());
    match sequencer.run(actions) {
        Ok(summary) => {
            tracing::debug!("{} actions executed", summary.actions_executed);
            CliResult::success()
        }
        Err(e) => e.into(),
    }
}

/// Log to stderr so stdout carries only device data
fn init_logging(config: &AppConfig, quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

fn print_ports() -> anyhow::Result<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        tracing::warn!("No serial ports found.");
        return Ok(());
    }
    for port in &ports {
        println!("{}", port.port_name);
    }
    Ok(())
}
