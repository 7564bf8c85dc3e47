//! The per-fix navigation pipeline.
//!
//! [`Navigator::handle_fix`] matches a fix to the route first and only then
//! commits it: heading and speed, off-route detection, geometry trimming and
//! arrival run in that order, each reading the tracking result. A fix that
//! fails validation or tracking is dropped before any state changes.
#![expect(
    clippy::float_arithmetic,
    reason = "speed, ETA and progress are floating-point quantities"
)]

use std::sync::Arc;
use std::time::Duration;

use courier_core::geodesy::{bearing, distance, path_length};
use courier_core::{
    ArrivalController, ArrivalEvent, GeoPoint, GeometryTrimmer, Leg, Location, OffRouteMonitor,
    OffRouteTransition, PositionFix, Route, RouteError, RouteTracker, SequenceState, Step, Stop,
    TrimmedPath,
};

use crate::{NavigatorConfig, NavigatorError};

/// Elapsed time assumed between fixes that carry no timestamps.
const ASSUMED_FIX_INTERVAL: Duration = Duration::from_secs(1);

/// Something noteworthy that happened while handling a fix.
#[derive(Debug, Clone)]
pub enum NavigationEvent {
    /// The vehicle left the active leg.
    OffRoute {
        /// Distance from the leg when the flag was raised.
        distance_m: f64,
    },
    /// The vehicle came back onto the active leg.
    BackOnRoute,
    /// A stop was reached and another remains.
    Arrived {
        /// The stop just reached.
        stop: Stop,
        /// The stop now being headed for.
        next: Stop,
    },
    /// The final stop was reached.
    Completed {
        /// The final stop.
        stop: Stop,
    },
}

#[derive(Debug, Clone, Copy)]
struct LastFix {
    position: GeoPoint,
    timestamp: Option<Duration>,
}

/// Owns the tracking state for one route and advances it fix by fix.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use courier_core::test_support::straight_route;
/// use courier_core::{GeoPoint, PositionFix, SequenceState, Stop};
/// use courier_session::{NavigationEvent, Navigator, NavigatorConfig};
///
/// let stops = vec![Stop::new("s0", GeoPoint::new(0.0, 0.01), "1 Mill Lane")];
/// let route = Arc::new(straight_route(GeoPoint::new(0.0, 0.0), &stops, 2));
/// let mut navigator = Navigator::new(route, stops, NavigatorConfig::default())?;
///
/// assert!(navigator.handle_fix(&PositionFix::new(0.0, 0.0))?.is_empty());
/// let events = navigator.handle_fix(&PositionFix::new(0.0, 0.01))?;
/// assert!(matches!(events.as_slice(), [NavigationEvent::Completed { .. }]));
/// assert_eq!(navigator.sequence_state(), SequenceState::Completed);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Navigator {
    config: NavigatorConfig,
    tracker: RouteTracker,
    off_route: OffRouteMonitor,
    trimmer: GeometryTrimmer,
    arrival: ArrivalController,
    last_fix: Option<LastFix>,
    heading: Option<f64>,
    speed_kmh: f64,
    location: Option<Location>,
    remaining_path: Option<TrimmedPath>,
}

impl Navigator {
    /// Prepare to navigate `route`, which must have one leg per stop.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::StopCountMismatch`] when the leg and stop
    /// counts differ.
    pub fn new(
        route: Arc<Route>,
        stops: Vec<Stop>,
        config: NavigatorConfig,
    ) -> Result<Self, RouteError> {
        route.validate_against(&stops)?;
        Ok(Self {
            config,
            tracker: RouteTracker::new(route),
            off_route: OffRouteMonitor::new(config.off_route),
            trimmer: GeometryTrimmer::new(config.trim_radius_m),
            arrival: ArrivalController::new(stops, config.arrival_radius_m),
            last_fix: None,
            heading: None,
            speed_kmh: 0.0,
            location: None,
            remaining_path: None,
        })
    }

    /// Run `fix` through the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`NavigatorError`] when the fix is dropped: it is malformed,
    /// cannot be matched to the route, or arrives after completion. The
    /// navigator's state is unchanged in every case.
    pub fn handle_fix(
        &mut self,
        fix: &PositionFix,
    ) -> Result<Vec<NavigationEvent>, NavigatorError> {
        if self.arrival.is_completed() {
            return Err(NavigatorError::Finished);
        }
        let position = fix.position()?;
        let location = self.tracker.locate(position)?;

        self.update_motion(position, fix.timestamp);
        let route = Arc::clone(self.tracker.route());
        let mut events = Vec::new();
        if let Some(leg) = route.leg(location.cursor.leg) {
            match self.off_route.update(position, leg) {
                OffRouteTransition::LeftRoute { distance_m } => {
                    events.push(NavigationEvent::OffRoute { distance_m });
                }
                OffRouteTransition::Rejoined => events.push(NavigationEvent::BackOnRoute),
                OffRouteTransition::Unchanged => {}
            }
            self.refresh_path(position, leg, &location);
        }
        self.location = Some(location);

        match self.arrival.update(position) {
            Some(ArrivalEvent::Advanced { arrived, next }) => {
                self.enter_next_leg(position, &route);
                events.push(NavigationEvent::Arrived {
                    stop: arrived,
                    next,
                });
            }
            Some(ArrivalEvent::Completed { arrived }) => {
                self.remaining_path = None;
                events.push(NavigationEvent::Completed { stop: arrived });
            }
            None => {}
        }
        Ok(events)
    }

    fn update_motion(&mut self, position: GeoPoint, timestamp: Option<Duration>) {
        if let Some(last) = self.last_fix {
            let moved_m = distance(last.position, position);
            if moved_m >= self.config.min_heading_move_m {
                self.heading = Some(bearing(last.position, position));
            }
            let elapsed = match (last.timestamp, timestamp) {
                (Some(before), Some(now)) if now > before => now - before,
                _ => ASSUMED_FIX_INTERVAL,
            };
            self.speed_kmh = moved_m / elapsed.as_secs_f64() * 3.6;
        }
        self.last_fix = Some(LastFix {
            position,
            timestamp,
        });
    }

    /// Keep the previous path when the vehicle is too far away to trim.
    fn refresh_path(&mut self, position: GeoPoint, leg: &Leg, location: &Location) {
        if let Some(path) = self.trimmer.trim(position, leg, location) {
            self.remaining_path = Some(path);
        }
    }

    fn enter_next_leg(&mut self, position: GeoPoint, route: &Route) {
        let SequenceState::EnRoute(next_leg) = self.arrival.state() else {
            return;
        };
        self.off_route.reset();
        self.remaining_path = None;
        self.location = None;
        if let Err(err) = self.tracker.advance_to_leg(next_leg) {
            log::warn!("could not move to leg {next_leg}: {err}");
            return;
        }
        match self.tracker.locate(position) {
            Ok(location) => {
                if let Some(leg) = route.leg(next_leg) {
                    self.refresh_path(position, leg, &location);
                }
                self.location = Some(location);
            }
            Err(err) => log::debug!("no guidance on leg {next_leg} yet: {err}"),
        }
    }

    /// Return every component to its initial state.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.off_route.reset();
        self.arrival.reset();
        self.last_fix = None;
        self.heading = None;
        self.speed_kmh = 0.0;
        self.location = None;
        self.remaining_path = None;
    }

    /// The route being followed.
    #[must_use]
    pub const fn route(&self) -> &Arc<Route> {
        self.tracker.route()
    }

    /// Progress through the stops.
    #[must_use]
    pub const fn sequence_state(&self) -> SequenceState {
        self.arrival.state()
    }

    /// The ordered stops.
    #[must_use]
    pub fn stops(&self) -> &[Stop] {
        self.arrival.stops()
    }

    /// The stop being headed for, if any.
    #[must_use]
    pub fn current_stop(&self) -> Option<&Stop> {
        self.arrival.current_stop()
    }

    /// The leg being followed.
    #[must_use]
    pub fn current_leg(&self) -> Option<&Leg> {
        self.tracker.current_leg()
    }

    /// The step under the tracker cursor.
    #[must_use]
    pub fn current_step(&self) -> Option<&Step> {
        self.tracker.current_step()
    }

    /// Latest tracking result on the current leg.
    #[must_use]
    pub const fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Last accepted position.
    #[must_use]
    pub fn position(&self) -> Option<GeoPoint> {
        self.last_fix.map(|last| last.position)
    }

    /// Direction of travel in degrees from north, once the vehicle has moved.
    #[must_use]
    pub const fn heading(&self) -> Option<f64> {
        self.heading
    }

    /// Speed between the last two fixes.
    #[must_use]
    pub const fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    /// Whether the vehicle is off the active leg.
    #[must_use]
    pub const fn is_off_route(&self) -> bool {
        self.off_route.is_off_route()
    }

    /// Remaining geometry of the current leg, from the vehicle onward.
    #[must_use]
    pub const fn remaining_path(&self) -> Option<&TrimmedPath> {
        self.remaining_path.as_ref()
    }

    /// Share of the current leg already driven, in `[0, 1]`.
    #[must_use]
    pub fn leg_progress(&self) -> f64 {
        let (Some(leg), Some(location)) = (self.current_leg(), self.location()) else {
            return 0.0;
        };
        let leg_length: f64 = leg.steps.iter().map(|step| path_length(&step.path)).sum();
        if leg_length > 0.0 {
            (1.0 - location.distance_remaining_m / leg_length).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Minutes to the current stop.
    ///
    /// Uses the current speed while moving, otherwise the provider's
    /// durations for the rest of the leg.
    #[must_use]
    pub fn eta_minutes(&self) -> Option<f64> {
        let location = self.location()?;
        if self.speed_kmh > self.config.moving_speed_kmh {
            Some(location.distance_remaining_m / 1_000.0 / self.speed_kmh * 60.0)
        } else {
            Some(location.duration_remaining.as_secs_f64() / 60.0)
        }
    }
}
