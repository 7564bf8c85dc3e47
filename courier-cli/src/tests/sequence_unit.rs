//! Focused unit tests covering the sequence command.

use super::helpers::{Workspace, write_utf8};
use super::*;
use crate::sequence::{SequenceArgs, SequenceConfig, config_from_layers_for_test, run_sequence_with};
use courier_core::{GeoPoint, Stop};
use rstest::rstest;

#[rstest]
#[case::stops(None, Some(1.0), Some(2.0), ARG_STOPS, ENV_SEQUENCE_STOPS)]
#[case::latitude(Some("stops.json"), None, Some(2.0), ARG_START_LAT, ENV_SEQUENCE_START_LAT)]
#[case::longitude(Some("stops.json"), Some(1.0), None, ARG_START_LNG, ENV_SEQUENCE_START_LNG)]
fn converting_without_required_fields_errors(
    #[case] stops: Option<&str>,
    #[case] start_lat: Option<f64>,
    #[case] start_lng: Option<f64>,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let args = SequenceArgs {
        stops: stops.map(Into::into),
        start_lat,
        start_lng,
    };
    let err = SequenceConfig::try_from(args).expect_err("missing field should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn sequence_prints_nearest_stop_first() {
    let workspace = Workspace::new();
    workspace.write_stops(&[
        Stop::new("far", GeoPoint::new(0.0, 0.03), "3 Wharf Street"),
        Stop::new("near", GeoPoint::new(0.0, 0.01), "1 Wharf Street"),
        Stop::new("middle", GeoPoint::new(0.0, 0.02), "2 Wharf Street"),
    ]);
    let config = SequenceConfig {
        stops: workspace.stops.clone(),
        start: GeoPoint::new(0.0, 0.0),
    };

    let mut output = Vec::new();
    run_sequence_with(&config, &mut output).expect("sequence succeeds");

    let ordered: Vec<Stop> = serde_json::from_slice(&output).expect("stops json");
    let ids: Vec<&str> = ordered.iter().map(|stop| stop.id.as_str()).collect();
    assert_eq!(ids, ["near", "middle", "far"]);
    assert_eq!(output.last(), Some(&b'\n'));
}

#[rstest]
fn empty_stop_list_prints_empty_array() {
    let workspace = Workspace::new();
    workspace.write_stops(&[]);
    let config = SequenceConfig {
        stops: workspace.stops.clone(),
        start: GeoPoint::new(51.5, -0.1),
    };

    let mut output = Vec::new();
    run_sequence_with(&config, &mut output).expect("sequence succeeds");
    assert_eq!(output, b"[]\n");
}

#[rstest]
fn missing_stops_file_is_reported() {
    let workspace = Workspace::new();
    let config = SequenceConfig {
        stops: workspace.stops.clone(),
        start: GeoPoint::new(0.0, 0.0),
    };

    let err = run_sequence_with(&config, &mut Vec::new()).expect_err("missing file");
    match err {
        CliError::MissingSourceFile { field, path } => {
            assert_eq!(field, ARG_STOPS);
            assert_eq!(path, workspace.stops);
        }
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn directory_is_not_a_stops_file() {
    let workspace = Workspace::new();
    let config = SequenceConfig {
        stops: workspace.root.clone(),
        start: GeoPoint::new(0.0, 0.0),
    };

    let err = run_sequence_with(&config, &mut Vec::new()).expect_err("directory rejected");
    match err {
        CliError::SourcePathNotFile { field, .. } => assert_eq!(field, ARG_STOPS),
        other => panic!("expected SourcePathNotFile, found {other:?}"),
    }
}

#[rstest]
fn malformed_stops_json_is_reported() {
    let workspace = Workspace::new();
    write_utf8(&workspace.stops, b"{ not valid json");
    let config = SequenceConfig {
        stops: workspace.stops.clone(),
        start: GeoPoint::new(0.0, 0.0),
    };

    let err = run_sequence_with(&config, &mut Vec::new()).expect_err("invalid json");
    match err {
        CliError::ParseInput { field, path, .. } => {
            assert_eq!(field, ARG_STOPS);
            assert_eq!(path, workspace.stops);
        }
        other => panic!("expected ParseInput, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "start_lat": "north" }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "tolerance comparison")]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "stops": "from-file.json",
            "start_lat": 10.0,
            "start_lng": 20.0,
        }),
        None,
    );
    composer.push_environment(json!({
        "stops": "from-env.json",
        "start_lat": 11.0,
    }));
    composer.push_cli(json!({ "start_lat": 12.0 }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.stops.as_str(), "from-env.json");
    assert!((config.start.lat - 12.0).abs() < f64::EPSILON);
    assert!((config.start.lng - 20.0).abs() < f64::EPSILON);
}
