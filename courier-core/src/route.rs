//! Routes returned by a routing provider.
//!
//! A [`Route`] is an ordered list of [`Leg`]s, one per stop, each made of
//! [`Step`]s carrying their own path geometry. Routes are immutable once
//! received; navigation only ever moves a cursor over them.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::format::{format_duration_minutes, format_kilometres};
use crate::{GeoPoint, Stop};

/// Maneuver tag attached to a step.
///
/// Tags use the hyphenated vocabulary common to directions services
/// (`turn-left`, `roundabout-right`, ...). Unknown tags map to
/// [`Maneuver::Straight`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "String", from = "String")
)]
pub enum Maneuver {
    /// Start of a leg.
    Depart,
    /// Continue straight ahead.
    #[default]
    Straight,
    /// Slight left turn.
    TurnSlightLeft,
    /// Left turn.
    TurnLeft,
    /// Sharp left turn.
    TurnSharpLeft,
    /// Slight right turn.
    TurnSlightRight,
    /// Right turn.
    TurnRight,
    /// Sharp right turn.
    TurnSharpRight,
    /// U-turn.
    UTurn,
    /// Keep left at a split.
    KeepLeft,
    /// Keep right at a split.
    KeepRight,
    /// Take the left branch of a fork.
    ForkLeft,
    /// Take the right branch of a fork.
    ForkRight,
    /// Merge into traffic.
    Merge,
    /// Ramp on the left.
    RampLeft,
    /// Ramp on the right.
    RampRight,
    /// Roundabout exiting to the left.
    RoundaboutLeft,
    /// Roundabout exiting to the right.
    RoundaboutRight,
    /// End of a leg.
    Arrive,
}

impl Maneuver {
    /// The hyphenated tag for this maneuver.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Depart => "depart",
            Self::Straight => "straight",
            Self::TurnSlightLeft => "turn-slight-left",
            Self::TurnLeft => "turn-left",
            Self::TurnSharpLeft => "turn-sharp-left",
            Self::TurnSlightRight => "turn-slight-right",
            Self::TurnRight => "turn-right",
            Self::TurnSharpRight => "turn-sharp-right",
            Self::UTurn => "uturn",
            Self::KeepLeft => "keep-left",
            Self::KeepRight => "keep-right",
            Self::ForkLeft => "fork-left",
            Self::ForkRight => "fork-right",
            Self::Merge => "merge",
            Self::RampLeft => "ramp-left",
            Self::RampRight => "ramp-right",
            Self::RoundaboutLeft => "roundabout-left",
            Self::RoundaboutRight => "roundabout-right",
            Self::Arrive => "arrive",
        }
    }

    /// Parse a tag, falling back to [`Maneuver::Straight`].
    ///
    /// # Examples
    /// ```
    /// use courier_core::Maneuver;
    ///
    /// assert_eq!(Maneuver::from_tag("turn-left"), Maneuver::TurnLeft);
    /// assert_eq!(Maneuver::from_tag("teleport"), Maneuver::Straight);
    /// ```
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "depart" => Self::Depart,
            "turn-slight-left" => Self::TurnSlightLeft,
            "turn-left" => Self::TurnLeft,
            "turn-sharp-left" => Self::TurnSharpLeft,
            "turn-slight-right" => Self::TurnSlightRight,
            "turn-right" => Self::TurnRight,
            "turn-sharp-right" => Self::TurnSharpRight,
            "uturn" | "uturn-left" | "uturn-right" => Self::UTurn,
            "keep-left" => Self::KeepLeft,
            "keep-right" => Self::KeepRight,
            "fork-left" => Self::ForkLeft,
            "fork-right" => Self::ForkRight,
            "merge" => Self::Merge,
            "ramp-left" => Self::RampLeft,
            "ramp-right" => Self::RampRight,
            "roundabout-left" => Self::RoundaboutLeft,
            "roundabout-right" => Self::RoundaboutRight,
            "arrive" => Self::Arrive,
            _ => Self::Straight,
        }
    }
}

impl fmt::Display for Maneuver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Maneuver> for String {
    fn from(maneuver: Maneuver) -> Self {
        maneuver.as_str().to_owned()
    }
}

impl From<String> for Maneuver {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

/// A maneuver-level segment of a leg.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    /// Instruction text shown to the driver.
    pub instruction: String,
    /// Maneuver performed at the start of the step.
    #[cfg_attr(feature = "serde", serde(default))]
    pub maneuver: Maneuver,
    /// Provider-reported distance in metres.
    pub distance_m: f64,
    /// Provider-reported travel time.
    pub duration: Duration,
    /// Ordered geometry of the step.
    pub path: Vec<GeoPoint>,
}

/// The portion of a route between two consecutive stops.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Leg {
    /// Contiguous steps making up the leg.
    pub steps: Vec<Step>,
    /// Where the leg begins.
    pub start: GeoPoint,
    /// Where the leg ends (the stop it leads to).
    pub end: GeoPoint,
    /// Display address of the start.
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_address: String,
    /// Display address of the end.
    #[cfg_attr(feature = "serde", serde(default))]
    pub end_address: String,
    /// Provider-reported leg distance in metres.
    pub distance_m: f64,
    /// Provider-reported leg travel time.
    pub duration: Duration,
}

/// Headline figures for a route, formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteSummary {
    /// Total distance, e.g. `"12.3 km"`.
    pub total_distance: String,
    /// Total duration, e.g. `"25 mins"`.
    pub total_duration: String,
}

/// Errors returned by [`Route::new`] and [`Route::validate_against`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The route has no legs.
    #[error("route must contain at least one leg")]
    Empty,
    /// A leg has no steps.
    #[error("leg {leg} has no steps")]
    EmptyLeg {
        /// Index of the offending leg.
        leg: usize,
    },
    /// A step has no geometry.
    #[error("step {step} of leg {leg} has no path points")]
    EmptyStepPath {
        /// Index of the leg containing the step.
        leg: usize,
        /// Index of the offending step.
        step: usize,
    },
    /// Leg count does not match the number of stops.
    #[error("route has {legs} legs but {stops} stops were requested")]
    StopCountMismatch {
        /// Number of legs in the route.
        legs: usize,
        /// Number of stops the route should visit.
        stops: usize,
    },
}

/// An ordered sequence of legs; leg `i` ends at stop `i`.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use courier_core::{GeoPoint, Leg, Route, Step};
///
/// let path = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.01)];
/// let step = Step {
///     instruction: "Head east".into(),
///     maneuver: Default::default(),
///     distance_m: 1_112.0,
///     duration: Duration::from_secs(90),
///     path: path.clone(),
/// };
/// let leg = Leg {
///     steps: vec![step],
///     start: path[0],
///     end: path[1],
///     start_address: String::new(),
///     end_address: "Depot".into(),
///     distance_m: 1_112.0,
///     duration: Duration::from_secs(90),
/// };
/// let route = Route::new(vec![leg])?;
/// assert_eq!(route.summary().total_distance, "1.1 km");
/// # Ok::<(), courier_core::RouteError>(())
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Leg>", into = "Vec<Leg>")
)]
pub struct Route {
    legs: Vec<Leg>,
}

impl Route {
    /// Validate and construct a route.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] when the route, a leg, or a step path is empty.
    pub fn new(legs: Vec<Leg>) -> Result<Self, RouteError> {
        if legs.is_empty() {
            return Err(RouteError::Empty);
        }
        for (leg_index, leg) in legs.iter().enumerate() {
            if leg.steps.is_empty() {
                return Err(RouteError::EmptyLeg { leg: leg_index });
            }
            if let Some(step_index) = leg.steps.iter().position(|step| step.path.is_empty()) {
                return Err(RouteError::EmptyStepPath {
                    leg: leg_index,
                    step: step_index,
                });
            }
        }
        Ok(Self { legs })
    }

    /// Legs in visiting order.
    #[must_use]
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Leg at `index`, if any.
    #[must_use]
    pub fn leg(&self, index: usize) -> Option<&Leg> {
        self.legs.get(index)
    }

    /// Check the route visits exactly one leg per stop.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::StopCountMismatch`] when the counts differ.
    pub fn validate_against(&self, stops: &[Stop]) -> Result<(), RouteError> {
        if self.legs.len() == stops.len() {
            Ok(())
        } else {
            Err(RouteError::StopCountMismatch {
                legs: self.legs.len(),
                stops: stops.len(),
            })
        }
    }

    /// Sum of leg distances in metres.
    #[must_use]
    pub fn total_distance_m(&self) -> f64 {
        self.legs.iter().map(|leg| leg.distance_m).sum()
    }

    /// Sum of leg durations.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.legs.iter().map(|leg| leg.duration).sum()
    }

    /// Display texts for the route totals.
    #[must_use]
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            total_distance: format_kilometres(self.total_distance_m()),
            total_duration: format_duration_minutes(self.total_duration()),
        }
    }
}

impl TryFrom<Vec<Leg>> for Route {
    type Error = RouteError;

    fn try_from(legs: Vec<Leg>) -> Result<Self, Self::Error> {
        Self::new(legs)
    }
}

impl From<Route> for Vec<Leg> {
    fn from(route: Route) -> Self {
        route.legs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{straight_leg, straight_route};
    use rstest::rstest;

    #[rstest]
    fn empty_route_is_rejected() {
        assert_eq!(Route::new(Vec::new()).unwrap_err(), RouteError::Empty);
    }

    #[rstest]
    fn leg_without_steps_is_rejected() {
        let mut leg = straight_leg(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.01), 2);
        leg.steps.clear();
        let err = Route::new(vec![leg]).unwrap_err();
        assert_eq!(err, RouteError::EmptyLeg { leg: 0 });
    }

    #[rstest]
    fn step_without_path_is_rejected() {
        let mut leg = straight_leg(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.01), 2);
        leg.steps[1].path.clear();
        let err = Route::new(vec![leg]).unwrap_err();
        assert_eq!(err, RouteError::EmptyStepPath { leg: 0, step: 1 });
    }

    #[rstest]
    fn validate_against_checks_leg_count() {
        let stops = vec![
            Stop::new("a", GeoPoint::new(0.0, 0.01), "A"),
            Stop::new("b", GeoPoint::new(0.0, 0.02), "B"),
        ];
        let route = straight_route(GeoPoint::new(0.0, 0.0), &stops, 2);
        assert!(route.validate_against(&stops).is_ok());
        let err = route.validate_against(&stops[..1]).unwrap_err();
        assert_eq!(err, RouteError::StopCountMismatch { legs: 2, stops: 1 });
    }

    #[rstest]
    fn summary_totals_all_legs() {
        let stops = vec![
            Stop::new("a", GeoPoint::new(0.0, 0.1), "A"),
            Stop::new("b", GeoPoint::new(0.0, 0.2), "B"),
        ];
        let route = straight_route(GeoPoint::new(0.0, 0.0), &stops, 2);
        let summary = route.summary();
        assert_eq!(summary.total_distance, "22.2 km");
        assert_eq!(route.total_duration(), route.legs()[0].duration * 2);
    }

    #[rstest]
    #[case(Maneuver::TurnLeft)]
    #[case(Maneuver::RoundaboutRight)]
    #[case(Maneuver::Arrive)]
    fn maneuver_tags_parse_back(#[case] maneuver: Maneuver) {
        assert_eq!(Maneuver::from_tag(maneuver.as_str()), maneuver);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn deserializing_validates_legs() {
        let err = serde_json::from_str::<Route>("[]").unwrap_err();
        assert!(err.to_string().contains("at least one leg"), "{err}");
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn maneuver_serializes_as_tag() {
        let json = serde_json::to_string(&Maneuver::TurnSharpRight).expect("serialize");
        assert_eq!(json, "\"turn-sharp-right\"");
        let parsed: Maneuver = serde_json::from_str("\"no-such-tag\"").expect("deserialize");
        assert_eq!(parsed, Maneuver::Straight);
    }
}
