//! Command-line interface for the Courier navigation engine.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};

mod error;
mod input;
mod navigate;
mod sequence;

pub use error::CliError;

use navigate::{NavigateArgs, run_navigate};
use sequence::{SequenceArgs, run_sequence};

const ARG_STOPS: &str = "stops";
const ARG_FIXES: &str = "fixes";
const ARG_START_LAT: &str = "start-lat";
const ARG_START_LNG: &str = "start-lng";
const ARG_OSRM_BASE_URL: &str = "osrm-base-url";
const ARG_KEEP_ORDER: &str = "keep-order";
const ARG_INTERVAL_MS: &str = "interval-ms";
const ENV_SEQUENCE_STOPS: &str = "COURIER_CMDS_SEQUENCE_STOPS";
const ENV_SEQUENCE_START_LAT: &str = "COURIER_CMDS_SEQUENCE_START_LAT";
const ENV_SEQUENCE_START_LNG: &str = "COURIER_CMDS_SEQUENCE_START_LNG";
const ENV_NAVIGATE_STOPS: &str = "COURIER_CMDS_NAVIGATE_STOPS";
const ENV_NAVIGATE_FIXES: &str = "COURIER_CMDS_NAVIGATE_FIXES";

/// Run the Courier CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, an
/// input file cannot be read, or the command itself fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Sequence(args) => run_sequence(args),
        Command::Navigate(args) => run_navigate(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "courier",
    about = "Stop sequencing and trace replay for the Courier navigation engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Order stops nearest-neighbour first from a starting position.
    Sequence(SequenceArgs),
    /// Replay a recorded position trace through a navigation session.
    Navigate(NavigateArgs),
}

fn write_json(writer: &mut dyn Write, payload: &str) -> Result<(), CliError> {
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    writer.flush().map_err(CliError::WriteOutput)
}

#[cfg(test)]
mod tests;
