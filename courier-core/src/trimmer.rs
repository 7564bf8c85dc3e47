//! Remaining-route geometry for display.
//!
//! The trimmed path starts at the vehicle's position and follows the leg
//! from the matched segment onward. It is rebuilt from scratch on every fix
//! and withheld when the position is too far from the route for the line to
//! make sense.

use geo::LineString;

use crate::geodesy::path_length;
use crate::{GeoPoint, Leg, Location};

/// Default distance from the route within which trimming applies.
pub const DEFAULT_TRIM_RADIUS_M: f64 = 50.0;

/// An ordered polyline from the current position to the end of the leg.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrimmedPath {
    points: Vec<GeoPoint>,
}

impl TrimmedPath {
    /// The points in travel order.
    #[must_use]
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Consume the path and return its points.
    #[must_use]
    pub fn into_points(self) -> Vec<GeoPoint> {
        self.points
    }

    /// Length of the path in metres.
    #[must_use]
    pub fn length_m(&self) -> f64 {
        path_length(&self.points)
    }

    /// Convert to a `geo` line string (x = longitude, y = latitude).
    #[must_use]
    pub fn to_line_string(&self) -> LineString<f64> {
        self.points.iter().copied().map(geo::Coord::from).collect()
    }
}

/// Builds [`TrimmedPath`]s from tracker output.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use courier_core::{GeoPoint, GeometryTrimmer, RouteTracker, Stop};
/// use courier_core::test_support::straight_route;
///
/// let stops = [Stop::new("a", GeoPoint::new(0.0, 0.01), "A")];
/// let route = Arc::new(straight_route(GeoPoint::new(0.0, 0.0), &stops, 2));
/// let mut tracker = RouteTracker::new(Arc::clone(&route));
/// let position = GeoPoint::new(0.0001, 0.002);
/// let location = tracker.locate(position)?;
///
/// let leg = route.leg(0).expect("one leg");
/// let trimmed = GeometryTrimmer::default()
///     .trim(position, leg, &location)
///     .expect("close to route");
/// assert_eq!(trimmed.points()[0].lat, position.lat);
/// # Ok::<(), courier_core::TrackError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GeometryTrimmer {
    radius_m: f64,
}

impl Default for GeometryTrimmer {
    fn default() -> Self {
        Self::new(DEFAULT_TRIM_RADIUS_M)
    }
}

impl GeometryTrimmer {
    /// Create a trimmer applying within `radius_m` of the route.
    #[must_use]
    pub const fn new(radius_m: f64) -> Self {
        Self { radius_m }
    }

    /// Radius within which trimming applies.
    #[must_use]
    pub const fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// Build the remaining path for `leg` from `position`.
    ///
    /// The path is `position`, then the matched step's vertices after the
    /// matched segment, then every vertex of the later steps. Returns `None`
    /// when the matched point is farther than the radius from `position`, or
    /// when the path would have fewer than two points.
    #[must_use]
    pub fn trim(&self, position: GeoPoint, leg: &Leg, location: &Location) -> Option<TrimmedPath> {
        if location.off_path_m > self.radius_m {
            log::debug!(
                "not trimming: {:.0} m from route exceeds {:.0} m",
                location.off_path_m,
                self.radius_m
            );
            return None;
        }
        let step_index = location.cursor.step;
        let matched_step = leg.steps.get(step_index)?;
        let rest_of_step = matched_step
            .path
            .get(location.segment.saturating_add(1)..)
            .unwrap_or_default();
        let later_steps = leg
            .steps
            .get(step_index.saturating_add(1)..)
            .unwrap_or_default();

        let points: Vec<GeoPoint> = std::iter::once(position)
            .chain(rest_of_step.iter().copied())
            .chain(later_steps.iter().flat_map(|step| step.path.iter().copied()))
            .collect();
        (points.len() >= 2).then_some(TrimmedPath { points })
    }
}
