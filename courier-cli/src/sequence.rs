//! Sequence command implementation for the Courier CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use courier_core::{GeoPoint, NearestNeighbourSequencer, Stop, StopSequencer};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::input::{load_stops, require_file};
use crate::{
    ARG_START_LAT, ARG_START_LNG, ARG_STOPS, CliError, ENV_SEQUENCE_START_LAT,
    ENV_SEQUENCE_START_LNG, ENV_SEQUENCE_STOPS, write_json,
};

/// CLI arguments for the `sequence` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Order a list of stops by repeatedly visiting the nearest \
                 unvisited stop, starting from the given position. The stops \
                 file holds a JSON array of {id, location: {lat, lng}, \
                 address} objects.",
    about = "Order stops nearest-neighbour first"
)]
#[ortho_config(prefix = "COURIER")]
pub(crate) struct SequenceArgs {
    /// Path to a JSON file containing the stops.
    #[arg(long = ARG_STOPS, value_name = "path")]
    #[serde(default)]
    pub(crate) stops: Option<Utf8PathBuf>,
    /// Latitude of the starting position.
    #[arg(long = ARG_START_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) start_lat: Option<f64>,
    /// Longitude of the starting position.
    #[arg(long = ARG_START_LNG, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) start_lng: Option<f64>,
}

impl SequenceArgs {
    pub(crate) fn into_config(self) -> Result<SequenceConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SequenceConfig::try_from(merged)
    }
}

/// Resolved `sequence` command configuration.
#[derive(Debug, Clone)]
pub(crate) struct SequenceConfig {
    pub(crate) stops: Utf8PathBuf,
    pub(crate) start: GeoPoint,
}

impl TryFrom<SequenceArgs> for SequenceConfig {
    type Error = CliError;

    fn try_from(args: SequenceArgs) -> Result<Self, Self::Error> {
        let stops = args.stops.ok_or(CliError::MissingArgument {
            field: ARG_STOPS,
            env: ENV_SEQUENCE_STOPS,
        })?;
        let lat = args.start_lat.ok_or(CliError::MissingArgument {
            field: ARG_START_LAT,
            env: ENV_SEQUENCE_START_LAT,
        })?;
        let lng = args.start_lng.ok_or(CliError::MissingArgument {
            field: ARG_START_LNG,
            env: ENV_SEQUENCE_START_LNG,
        })?;
        Ok(Self {
            stops,
            start: GeoPoint::new(lat, lng),
        })
    }
}

pub(super) fn run_sequence(args: SequenceArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    let config = args.into_config()?;
    run_sequence_with(&config, &mut stdout)
}

pub(super) fn run_sequence_with(
    config: &SequenceConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let ordered = sequence_stops(config)?;
    let payload = serde_json::to_string_pretty(&ordered).map_err(CliError::SerializeOutput)?;
    write_json(writer, &payload)
}

fn sequence_stops(config: &SequenceConfig) -> Result<Vec<Stop>, CliError> {
    require_file(&config.stops, ARG_STOPS)?;
    let stops = load_stops(&config.stops, ARG_STOPS)?;
    log::info!(
        "sequencing {} stops from ({}, {})",
        stops.len(),
        config.start.lat,
        config.start.lng
    );
    Ok(NearestNeighbourSequencer.sequence(config.start, stops))
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SequenceConfig, CliError> {
    let merged = SequenceArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SequenceConfig::try_from(merged)
}
