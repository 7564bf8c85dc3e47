//! OSRM API response types for the Route service.
//!
//! Only the fields the engine consumes are modelled; everything else in the
//! response is ignored.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#route-service>

use serde::Deserialize;

/// OSRM Route API response.
///
/// The `code` field is always present; `routes` and `waypoints` are present
/// on success.
#[derive(Debug, Deserialize)]
pub struct RouteResponse {
    /// Status code from OSRM.
    ///
    /// Common values:
    /// - `"Ok"` - Request was successful
    /// - `"NoRoute"` - No route between the coordinates
    /// - `"NoSegment"` - A coordinate could not be snapped to the network
    /// - `"InvalidQuery"` / `"InvalidValue"` / `"InvalidOptions"` - Bad request
    pub code: String,

    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,

    /// Alternative routes, best first.
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,

    /// Input coordinates snapped to the road network, in request order.
    #[serde(default)]
    pub waypoints: Vec<OsrmWaypoint>,
}

impl RouteResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == "Ok"
    }
}

/// A single route through all waypoints.
#[derive(Debug, Deserialize)]
pub struct OsrmRoute {
    /// One leg per pair of consecutive waypoints.
    pub legs: Vec<OsrmLeg>,
}

/// The part of a route between two waypoints.
#[derive(Debug, Deserialize)]
pub struct OsrmLeg {
    /// Leg distance in metres.
    pub distance: f64,
    /// Leg duration in seconds.
    pub duration: f64,
    /// Turn-by-turn steps; empty unless the request set `steps=true`.
    #[serde(default)]
    pub steps: Vec<OsrmStep>,
}

/// A maneuver-level step.
#[derive(Debug, Deserialize)]
pub struct OsrmStep {
    /// Step distance in metres.
    pub distance: f64,
    /// Step duration in seconds.
    pub duration: f64,
    /// Name of the road travelled on during the step.
    #[serde(default)]
    pub name: String,
    /// Step geometry; GeoJSON because the request sets `geometries=geojson`.
    pub geometry: GeoJsonLineString,
    /// The maneuver at the start of the step.
    pub maneuver: OsrmManeuver,
}

/// GeoJSON `LineString` geometry.
#[derive(Debug, Deserialize)]
pub struct GeoJsonLineString {
    /// `[longitude, latitude]` pairs.
    pub coordinates: Vec<[f64; 2]>,
}

/// Maneuver description.
#[derive(Debug, Deserialize)]
pub struct OsrmManeuver {
    /// Maneuver type, e.g. `"turn"`, `"depart"`, `"roundabout"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Direction modifier, e.g. `"left"`, `"slight right"`.
    pub modifier: Option<String>,
    /// Roundabout exit number.
    pub exit: Option<u32>,
}

/// A snapped input coordinate.
#[derive(Debug, Deserialize)]
pub struct OsrmWaypoint {
    /// Name of the street the coordinate was snapped to.
    #[serde(default)]
    pub name: String,
}
