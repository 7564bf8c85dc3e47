//! Test helpers for writing stop lists and fix traces to disk.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use courier_core::test_support::{StraightLineRouteProvider, straight_route};
use courier_core::{GeoPoint, PositionFix, RoutingProvider, Stop};
use tempfile::TempDir;

use crate::CliError;
use crate::navigate::{NavigateConfig, RouteProviderBuilder};

pub(super) const ORIGIN: GeoPoint = GeoPoint::new(0.0, 0.0);

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write fixture file");
}

pub(super) fn stops() -> Vec<Stop> {
    vec![
        Stop::new("S0", GeoPoint::new(0.0, 0.01), "1 Wharf Street"),
        Stop::new("S1", GeoPoint::new(0.0, 0.02), "2 Wharf Street"),
    ]
}

/// Fixes along the straight route through `stops`, starting at [`ORIGIN`].
pub(super) fn trace(stops: &[Stop]) -> Vec<PositionFix> {
    straight_route(ORIGIN, stops, 2)
        .legs()
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .flat_map(|step| step.path.iter().copied())
        .map(PositionFix::from)
        .collect()
}

/// A temporary directory holding `stops.json` and `fixes.json`.
pub(super) struct Workspace {
    _dir: TempDir,
    pub(super) root: Utf8PathBuf,
    pub(super) stops: Utf8PathBuf,
    pub(super) fixes: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        let stops_path = root.join("stops.json");
        let fixes_path = root.join("fixes.json");
        Self {
            _dir: dir,
            root,
            stops: stops_path,
            fixes: fixes_path,
        }
    }

    pub(super) fn write_stops(&self, stops: &[Stop]) {
        let payload = serde_json::to_vec(stops).expect("serialize stops");
        write_utf8(&self.stops, &payload);
    }

    pub(super) fn write_fixes(&self, fixes: &[PositionFix]) {
        let payload = serde_json::to_vec(fixes).expect("serialize fixes");
        write_utf8(&self.fixes, &payload);
    }

    pub(super) fn navigate_config(&self) -> NavigateConfig {
        NavigateConfig {
            stops: self.stops.clone(),
            fixes: self.fixes.clone(),
            osrm_base_url: "http://localhost:5000".to_owned(),
            keep_order: false,
            interval: std::time::Duration::from_millis(100),
        }
    }
}

/// Routes along straight lines instead of calling OSRM.
pub(super) struct StraightLineBuilder;

impl RouteProviderBuilder for StraightLineBuilder {
    fn build(&self, _config: &NavigateConfig) -> Result<Arc<dyn RoutingProvider>, CliError> {
        Ok(Arc::new(StraightLineRouteProvider::default()))
    }
}

/// Decode JSON-lines output into values.
pub(super) fn json_lines(output: &[u8]) -> Vec<serde_json::Value> {
    std::str::from_utf8(output)
        .expect("utf-8 output")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect()
}
