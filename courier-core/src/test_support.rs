//! Deterministic doubles used by unit, behaviour and session tests.
//!
//! Routes built here run in straight lines between their endpoints, split
//! into equal steps whose paths carry a midpoint vertex. Every step takes
//! [`STEP_DURATION`], so leg durations depend only on the step count.
#![expect(
    clippy::float_arithmetic,
    reason = "interpolating straight-line geometry"
)]

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::geodesy::path_length;
use crate::{
    AnnounceError, Announcer, GeoPoint, Leg, Maneuver, Route, RouteRequest, RoutingError,
    RoutingProvider, Step, Stop,
};

/// Travel time assigned to every generated step.
pub const STEP_DURATION: Duration = Duration::from_secs(60);

fn interpolate(start: GeoPoint, end: GeoPoint, fraction: f64) -> GeoPoint {
    GeoPoint::new(
        start.lat + (end.lat - start.lat) * fraction,
        start.lng + (end.lng - start.lng) * fraction,
    )
}

/// A leg from `start` to `end` split into `step_count` equal steps (at least one).
#[must_use]
pub fn straight_leg(start: GeoPoint, end: GeoPoint, step_count: u32) -> Leg {
    let count = step_count.max(1);
    let total = f64::from(count);
    let vertex = |i: u32| {
        if i >= count {
            end
        } else {
            interpolate(start, end, f64::from(i) / total)
        }
    };

    let steps: Vec<Step> = (0..count)
        .map(|i| {
            let from = vertex(i);
            let to = vertex(i.saturating_add(1));
            let path = vec![from, interpolate(from, to, 0.5), to];
            let (instruction, maneuver) = if i == 0 {
                ("Depart".to_owned(), Maneuver::Depart)
            } else {
                (format!("Continue straight (step {i})"), Maneuver::Straight)
            };
            Step {
                instruction,
                maneuver,
                distance_m: path_length(&path),
                duration: STEP_DURATION,
                path,
            }
        })
        .collect();

    Leg {
        distance_m: steps.iter().map(|s| s.distance_m).sum(),
        duration: steps.iter().map(|s| s.duration).sum(),
        steps,
        start,
        end,
        start_address: String::new(),
        end_address: String::new(),
    }
}

/// Legs joining consecutive `points`, each split into `steps_per_leg` steps.
///
/// # Errors
///
/// Returns [`RoutingError::EmptyStops`] for fewer than two points.
pub fn straight_route_through(
    points: &[GeoPoint],
    steps_per_leg: u32,
) -> Result<Route, RoutingError> {
    let legs: Vec<Leg> = points
        .windows(2)
        .filter_map(|pair| match pair {
            [a, b] => Some(straight_leg(*a, *b, steps_per_leg)),
            _ => None,
        })
        .collect();
    if legs.is_empty() {
        return Err(RoutingError::EmptyStops);
    }
    Ok(Route::new(legs)?)
}

/// A route from `origin` through `stops`, with stop addresses on each leg.
///
/// An empty `stops` yields a single zero-length leg at `origin`.
///
/// # Panics
///
/// Never in practice: generated legs always carry steps with paths.
#[must_use]
pub fn straight_route(origin: GeoPoint, stops: &[Stop], steps_per_leg: u32) -> Route {
    let mut legs = Vec::with_capacity(stops.len().max(1));
    let mut from = origin;
    let mut from_address = String::new();
    for stop in stops {
        let mut leg = straight_leg(from, stop.location, steps_per_leg);
        leg.start_address = from_address;
        leg.end_address.clone_from(&stop.address);
        legs.push(leg);
        from = stop.location;
        from_address = stop.address.clone();
    }
    if legs.is_empty() {
        legs.push(straight_leg(origin, origin, steps_per_leg));
    }
    match Route::new(legs) {
        Ok(route) => route,
        Err(err) => panic!("straight-line route rejected: {err}"),
    }
}

/// Routing provider that joins the request points with straight lines.
#[derive(Debug, Clone, Copy)]
pub struct StraightLineRouteProvider {
    steps_per_leg: u32,
}

impl Default for StraightLineRouteProvider {
    fn default() -> Self {
        Self::new(2)
    }
}

impl StraightLineRouteProvider {
    /// Provider splitting each leg into `steps_per_leg` steps.
    #[must_use]
    pub const fn new(steps_per_leg: u32) -> Self {
        Self { steps_per_leg }
    }
}

#[async_trait]
impl RoutingProvider for StraightLineRouteProvider {
    async fn compute_route(&self, request: &RouteRequest) -> Result<Route, RoutingError> {
        let points: Vec<GeoPoint> = request.points().collect();
        straight_route_through(&points, self.steps_per_leg)
    }
}

/// What a [`RecordingAnnouncer`] was asked to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    /// A spoken announcement.
    Spoken(String),
    /// A notification with title and body.
    Notified {
        /// Notification title.
        title: String,
        /// Notification body.
        body: String,
    },
}

/// Announcer that records every call and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingAnnouncer {
    log: Mutex<Vec<Announcement>>,
    fail: bool,
}

impl RecordingAnnouncer {
    /// An announcer that records and then reports failure for every call.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            log: Mutex::default(),
            fail: true,
        }
    }

    /// Everything recorded so far, in call order.
    #[must_use]
    pub fn recorded(&self) -> Vec<Announcement> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Spoken texts recorded so far.
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.recorded()
            .into_iter()
            .filter_map(|a| match a {
                Announcement::Spoken(text) => Some(text),
                Announcement::Notified { .. } => None,
            })
            .collect()
    }

    /// Notification titles recorded so far.
    #[must_use]
    pub fn titles(&self) -> Vec<String> {
        self.recorded()
            .into_iter()
            .filter_map(|a| match a {
                Announcement::Notified { title, .. } => Some(title),
                Announcement::Spoken(_) => None,
            })
            .collect()
    }

    fn record(&self, entry: Announcement) -> Result<(), AnnounceError> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        if self.fail {
            Err(AnnounceError::Unavailable("recording announcer set to fail".to_owned()))
        } else {
            Ok(())
        }
    }
}

impl Announcer for RecordingAnnouncer {
    fn announce(&self, text: &str) -> Result<(), AnnounceError> {
        self.record(Announcement::Spoken(text.to_owned()))
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), AnnounceError> {
        self.record(Announcement::Notified {
            title: title.to_owned(),
            body: body.to_owned(),
        })
    }
}
