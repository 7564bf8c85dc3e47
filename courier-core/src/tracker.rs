//! Cursor tracking over an immutable route.
//!
//! [`RouteTracker`] owns a shared [`Route`] and a [`RouteCursor`]. Each call
//! to [`RouteTracker::locate`] projects a position onto every segment of the
//! current leg and takes the closest point. Matches behind the cursor step
//! are re-projected onto the cursor step, so the cursor never moves back.
//!
//! A forward match is committed straight away only when the path distance
//! from the previous match is reachable given how far the vehicle actually
//! moved. Otherwise the jump is held until a second fix confirms it, so one
//! noisy fix near a later part of a looping leg cannot skip the guidance
//! ahead.
#![expect(
    clippy::float_arithmetic,
    reason = "progress along the route is measured in floating-point metres"
)]

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::geodesy::{SegmentProjection, distance, path_length, project_onto_segment};
use crate::{GeoPoint, Leg, Maneuver, Route, Step};

/// Maximum number of upcoming steps reported by [`RouteTracker::locate`].
pub const MAX_UPCOMING_STEPS: usize = 3;

/// Ratio between path distance and straight-line distance a forward match
/// may cover without confirmation.
pub const MAX_DETOUR_FACTOR: f64 = 1.5;

/// Extra path distance, in metres, a forward match may cover without
/// confirmation.
pub const JUMP_SLACK_M: f64 = 50.0;

/// Position of the tracker within a route.
///
/// Cursors order lexicographically by leg, then step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteCursor {
    /// Index of the current leg.
    pub leg: usize,
    /// Index of the current step within the leg.
    pub step: usize,
}

/// A step ahead of the driver, for the "upcoming turns" list.
#[derive(Debug, Clone)]
pub struct UpcomingStep {
    /// Instruction text.
    pub instruction: String,
    /// Maneuver tag.
    pub maneuver: Maneuver,
    /// Provider-reported step distance in metres.
    pub distance_m: f64,
}

impl From<&Step> for UpcomingStep {
    fn from(step: &Step) -> Self {
        Self {
            instruction: step.instruction.clone(),
            maneuver: step.maneuver,
            distance_m: step.distance_m,
        }
    }
}

/// Result of matching a position against the current leg.
#[derive(Debug, Clone)]
pub struct Location {
    /// Cursor after the match.
    pub cursor: RouteCursor,
    /// Closest point on the matched step's path.
    pub matched: GeoPoint,
    /// Index of the path segment holding [`Self::matched`] within the step.
    pub segment: usize,
    /// Distance from the position to [`Self::matched`].
    pub off_path_m: f64,
    /// Path distance from [`Self::matched`] to the end of the step.
    pub distance_to_step_end_m: f64,
    /// Path distance from [`Self::matched`] to the end of the leg.
    pub distance_remaining_m: f64,
    /// Provider travel time for the rest of the leg, prorated within the
    /// current step.
    pub duration_remaining: Duration,
    /// Up to [`MAX_UPCOMING_STEPS`] steps following the current one.
    pub upcoming: Vec<UpcomingStep>,
}

/// Errors from [`RouteTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrackError {
    /// The cursor points past the last leg.
    #[error("leg {leg} is outside a route of {legs} legs")]
    LegOutOfRange {
        /// Requested leg index.
        leg: usize,
        /// Number of legs in the route.
        legs: usize,
    },
    /// The current leg has no geometry at or after the cursor step.
    #[error("leg {leg} has no geometry from step {step} onward")]
    NoGeometry {
        /// Leg index.
        leg: usize,
        /// First step searched.
        step: usize,
    },
}

/// Tracks progress through a route.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use courier_core::{GeoPoint, RouteTracker, Stop};
/// use courier_core::test_support::straight_route;
///
/// let stops = [Stop::new("a", GeoPoint::new(0.0, 0.01), "A")];
/// let route = Arc::new(straight_route(GeoPoint::new(0.0, 0.0), &stops, 2));
/// let mut tracker = RouteTracker::new(route);
///
/// let location = tracker.locate(GeoPoint::new(0.0, 0.007))?;
/// assert_eq!(location.cursor.step, 1);
/// assert!(location.distance_to_step_end_m < 400.0);
/// # Ok::<(), courier_core::TrackError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RouteTracker {
    route: Arc<Route>,
    cursor: RouteCursor,
    last: Option<LastMatch>,
    pending_step: Option<usize>,
}

/// The previous fix and how far along the leg it matched.
#[derive(Debug, Clone, Copy)]
struct LastMatch {
    position: GeoPoint,
    along_m: f64,
}

/// Closest point found while scanning the leg.
#[derive(Debug, Clone, Copy)]
struct StepMatch {
    step: usize,
    segment: usize,
    projection: SegmentProjection,
}

impl RouteTracker {
    /// Start tracking `route` from its first step.
    #[must_use]
    pub fn new(route: Arc<Route>) -> Self {
        Self {
            route,
            cursor: RouteCursor::default(),
            last: None,
            pending_step: None,
        }
    }

    /// The route being tracked.
    #[must_use]
    pub const fn route(&self) -> &Arc<Route> {
        &self.route
    }

    /// The current cursor.
    #[must_use]
    pub const fn cursor(&self) -> RouteCursor {
        self.cursor
    }

    /// The leg under the cursor.
    #[must_use]
    pub fn current_leg(&self) -> Option<&Leg> {
        self.route.leg(self.cursor.leg)
    }

    /// The step under the cursor.
    #[must_use]
    pub fn current_step(&self) -> Option<&Step> {
        self.current_leg()
            .and_then(|leg| leg.steps.get(self.cursor.step))
    }

    /// Move the cursor to the start of `leg`.
    ///
    /// Requests for the current or an earlier leg leave the cursor unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::LegOutOfRange`] when `leg` does not exist.
    pub fn advance_to_leg(&mut self, leg: usize) -> Result<(), TrackError> {
        let legs = self.route.legs().len();
        if leg >= legs {
            return Err(TrackError::LegOutOfRange { leg, legs });
        }
        if leg > self.cursor.leg {
            self.cursor = RouteCursor { leg, step: 0 };
            self.forget_matches();
        }
        Ok(())
    }

    /// Return the cursor to the first step of the first leg.
    pub fn reset(&mut self) {
        self.cursor = RouteCursor::default();
        self.forget_matches();
    }

    const fn forget_matches(&mut self) {
        self.last = None;
        self.pending_step = None;
    }

    /// Match `position` against the current leg and advance the cursor.
    ///
    /// The cursor never moves backwards, and an implausible forward jump is
    /// only taken once the following fix confirms it. On error the cursor is
    /// left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError`] when the cursor leg does not exist or has no
    /// geometry.
    pub fn locate(&mut self, position: GeoPoint) -> Result<Location, TrackError> {
        let cursor = self.cursor;
        let route = Arc::clone(&self.route);
        let leg = route.leg(cursor.leg).ok_or(TrackError::LegOutOfRange {
            leg: cursor.leg,
            legs: route.legs().len(),
        })?;
        let nearest =
            closest_point(position, leg, 0..=usize::MAX).ok_or(TrackError::NoGeometry {
                leg: cursor.leg,
                step: cursor.step,
            })?;
        let found = self.settle(position, leg, nearest);
        let step = leg.steps.get(found.step).ok_or(TrackError::NoGeometry {
            leg: cursor.leg,
            step: found.step,
        })?;

        let to_step_end = distance_to_step_end(step, found);
        let later_steps = leg.steps.get(found.step.saturating_add(1)..).unwrap_or_default();
        let later_distance: f64 = later_steps.iter().map(|s| path_length(&s.path)).sum();
        let later_duration: Duration = later_steps.iter().map(|s| s.duration).sum();
        let step_length = path_length(&step.path);
        let remaining_share = if step_length > 0.0 {
            (to_step_end / step_length).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let location = Location {
            cursor: RouteCursor {
                leg: cursor.leg,
                step: found.step,
            },
            matched: found.projection.point,
            segment: found.segment,
            off_path_m: found.projection.distance,
            distance_to_step_end_m: to_step_end,
            distance_remaining_m: to_step_end + later_distance,
            duration_remaining: step.duration.mul_f64(remaining_share) + later_duration,
            upcoming: later_steps
                .iter()
                .take(MAX_UPCOMING_STEPS)
                .map(UpcomingStep::from)
                .collect(),
        };
        if location.cursor != self.cursor {
            log::debug!(
                "tracker cursor moved from {:?} to {:?}",
                self.cursor,
                location.cursor
            );
        }
        self.cursor = location.cursor;
        self.last = Some(LastMatch {
            position,
            along_m: along_leg(leg, found),
        });
        Ok(location)
    }

    /// Decide which match to report for `nearest`, the closest point on the
    /// whole leg.
    fn settle(&mut self, position: GeoPoint, leg: &Leg, nearest: StepMatch) -> StepMatch {
        let current = self.cursor.step;
        if nearest.step <= current {
            self.pending_step = None;
            if nearest.step == current {
                return nearest;
            }
            return on_cursor_step(position, leg, current).unwrap_or(nearest);
        }

        let confirmed = self.pending_step.is_some_and(|step| nearest.step >= step);
        if confirmed || self.reachable(position, along_leg(leg, nearest)) {
            self.pending_step = None;
            return nearest;
        }

        log::debug!(
            "holding tracker on step {current}; jump to step {} needs confirmation",
            nearest.step
        );
        self.pending_step = Some(nearest.step);
        on_cursor_step(position, leg, current).unwrap_or(nearest)
    }

    /// Whether moving along the path to `along_m` fits the distance actually
    /// travelled since the previous fix.
    fn reachable(&self, position: GeoPoint, along_m: f64) -> bool {
        self.last.is_none_or(|last| {
            let jumped = along_m - last.along_m;
            let travelled = distance(last.position, position);
            jumped <= travelled.mul_add(MAX_DETOUR_FACTOR, JUMP_SLACK_M)
        })
    }
}

/// Closest point on the cursor step, falling back to any later step when
/// the cursor step has no geometry.
fn on_cursor_step(position: GeoPoint, leg: &Leg, step: usize) -> Option<StepMatch> {
    closest_point(position, leg, step..=step)
        .or_else(|| closest_point(position, leg, step..=usize::MAX))
}

/// Closest point on the steps of `leg` whose index lies in `steps`.
///
/// Ties keep the earliest candidate.
fn closest_point(
    position: GeoPoint,
    leg: &Leg,
    steps: RangeInclusive<usize>,
) -> Option<StepMatch> {
    let mut best: Option<StepMatch> = None;
    for (step_index, step) in leg
        .steps
        .iter()
        .enumerate()
        .filter(|(index, _)| steps.contains(index))
    {
        for candidate in step_projections(position, step, step_index) {
            if best.is_none_or(|b| candidate.projection.distance < b.projection.distance) {
                best = Some(candidate);
            }
        }
    }
    best
}

fn step_projections(
    position: GeoPoint,
    step: &Step,
    step_index: usize,
) -> impl Iterator<Item = StepMatch> + '_ {
    let single = match step.path.as_slice() {
        [only] => Some(StepMatch {
            step: step_index,
            segment: 0,
            projection: project_onto_segment(position, *only, *only),
        }),
        _ => None,
    };
    let segments = step
        .path
        .windows(2)
        .enumerate()
        .filter_map(move |(segment, pair)| match pair {
            [a, b] => Some(StepMatch {
                step: step_index,
                segment,
                projection: project_onto_segment(position, *a, *b),
            }),
            _ => None,
        });
    single.into_iter().chain(segments)
}

/// Path distance from the start of `leg` to the matched point.
fn along_leg(leg: &Leg, found: StepMatch) -> f64 {
    let before: f64 = leg
        .steps
        .iter()
        .take(found.step)
        .map(|s| path_length(&s.path))
        .sum();
    let within = leg.steps.get(found.step).map_or(0.0, |step| {
        (path_length(&step.path) - distance_to_step_end(step, found)).max(0.0)
    });
    before + within
}

/// Path distance from the matched point to the last vertex of `step`.
fn distance_to_step_end(step: &Step, found: StepMatch) -> f64 {
    match step.path.get(found.segment.saturating_add(1)..) {
        Some(rest @ [next, ..]) => distance(found.projection.point, *next) + path_length(rest),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Stop;
    use crate::test_support::straight_route;
    use rstest::{fixture, rstest};

    /// Two legs due east along the equator, four steps each.
    #[fixture]
    fn tracker() -> RouteTracker {
        let stops = [
            Stop::new("a", GeoPoint::new(0.0, 0.04), "A"),
            Stop::new("b", GeoPoint::new(0.0, 0.08), "B"),
        ];
        RouteTracker::new(Arc::new(straight_route(GeoPoint::new(0.0, 0.0), &stops, 4)))
    }

    #[rstest]
    fn starts_at_first_step(tracker: RouteTracker) {
        assert_eq!(tracker.cursor(), RouteCursor::default());
    }

    #[rstest]
    fn matches_step_containing_position(mut tracker: RouteTracker) {
        let location = tracker.locate(GeoPoint::new(0.0001, 0.025)).expect("on leg");
        assert_eq!(location.cursor, RouteCursor { leg: 0, step: 2 });
        assert!(location.off_path_m < 12.0, "got {}", location.off_path_m);
        let to_end = distance(GeoPoint::new(0.0, 0.025), GeoPoint::new(0.0, 0.03));
        assert!((location.distance_to_step_end_m - to_end).abs() < 1.0);
    }

    #[rstest]
    fn cursor_does_not_move_backwards(mut tracker: RouteTracker) {
        tracker.locate(GeoPoint::new(0.0, 0.035)).expect("on leg");
        let location = tracker.locate(GeoPoint::new(0.0, 0.005)).expect("on leg");
        assert_eq!(location.cursor.step, 3);
        assert_eq!(tracker.cursor().step, 3);
    }

    #[rstest]
    fn remaining_distance_covers_rest_of_leg(mut tracker: RouteTracker) {
        let location = tracker.locate(GeoPoint::new(0.0, 0.01)).expect("on leg");
        let expected = distance(GeoPoint::new(0.0, 0.01), GeoPoint::new(0.0, 0.04));
        assert!((location.distance_remaining_m - expected).abs() < 1.0);
        assert!(location.duration_remaining > Duration::ZERO);
    }

    #[rstest]
    fn upcoming_steps_are_capped(mut tracker: RouteTracker) {
        let first = tracker.locate(GeoPoint::new(0.0, 0.001)).expect("on leg");
        assert_eq!(first.upcoming.len(), MAX_UPCOMING_STEPS);
        let last = tracker.locate(GeoPoint::new(0.0, 0.039)).expect("on leg");
        assert!(last.upcoming.is_empty());
    }

    #[rstest]
    fn advance_to_leg_moves_forward_only(mut tracker: RouteTracker) {
        tracker.advance_to_leg(1).expect("leg exists");
        assert_eq!(tracker.cursor(), RouteCursor { leg: 1, step: 0 });
        tracker.advance_to_leg(0).expect("leg exists");
        assert_eq!(tracker.cursor().leg, 1);
        let err = tracker.advance_to_leg(2).unwrap_err();
        assert_eq!(err, TrackError::LegOutOfRange { leg: 2, legs: 2 });
    }

    #[rstest]
    fn locate_searches_only_current_leg(mut tracker: RouteTracker) {
        let location = tracker.locate(GeoPoint::new(0.0, 0.07)).expect("on leg");
        assert_eq!(location.cursor.leg, 0);
        assert_eq!(location.cursor.step, 3);
        assert!(location.off_path_m > 3_000.0);
    }

    /// East along the equator for ~1.1 km, 40 m north, then back west.
    #[fixture]
    fn u_turn_tracker() -> RouteTracker {
        let corner = GeoPoint::new(0.0, 0.01);
        let return_start = GeoPoint::new(0.00036, 0.01);
        let end = GeoPoint::new(0.00036, 0.0);
        let step = |instruction: &str, maneuver, path: Vec<GeoPoint>| Step {
            instruction: instruction.to_owned(),
            maneuver,
            distance_m: path_length(&path),
            duration: Duration::from_secs(60),
            path,
        };
        let steps = vec![
            step(
                "Head east on Outbound Street",
                Maneuver::Depart,
                vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.005), corner],
            ),
            step("Turn left onto Connector", Maneuver::TurnLeft, vec![corner, return_start]),
            step(
                "Turn left onto Return Street",
                Maneuver::TurnLeft,
                vec![return_start, GeoPoint::new(0.00036, 0.005), end],
            ),
        ];
        let leg = Leg {
            distance_m: steps.iter().map(|s| s.distance_m).sum(),
            duration: steps.iter().map(|s| s.duration).sum(),
            steps,
            start: GeoPoint::new(0.0, 0.0),
            end,
            start_address: "Depot".to_owned(),
            end_address: "Return Street".to_owned(),
        };
        RouteTracker::new(Arc::new(Route::new(vec![leg]).expect("valid route")))
    }

    #[rstest]
    fn single_stray_fix_does_not_skip_to_parallel_street(mut u_turn_tracker: RouteTracker) {
        let start = u_turn_tracker.locate(GeoPoint::new(0.0, 0.001)).expect("on leg");
        assert_eq!(start.cursor.step, 0);

        let stray = u_turn_tracker
            .locate(GeoPoint::new(0.0003, 0.002))
            .expect("on leg");
        assert_eq!(stray.cursor.step, 0);

        let next = u_turn_tracker.locate(GeoPoint::new(0.0, 0.003)).expect("on leg");
        assert_eq!(next.cursor.step, 0);
        assert!(next.off_path_m < 1.0, "got {}", next.off_path_m);
        assert!(
            next.distance_to_step_end_m > 700.0,
            "got {}",
            next.distance_to_step_end_m
        );
    }

    #[rstest]
    fn repeated_fixes_confirm_a_forward_jump(mut u_turn_tracker: RouteTracker) {
        u_turn_tracker.locate(GeoPoint::new(0.0, 0.001)).expect("on leg");
        let held = u_turn_tracker
            .locate(GeoPoint::new(0.00036, 0.002))
            .expect("on leg");
        assert_eq!(held.cursor.step, 0);

        let confirmed = u_turn_tracker
            .locate(GeoPoint::new(0.00036, 0.0019))
            .expect("on leg");
        assert_eq!(confirmed.cursor.step, 2);
        assert!(confirmed.off_path_m < 1.0, "got {}", confirmed.off_path_m);
    }

    #[rstest]
    fn driving_the_loop_advances_through_every_step(mut u_turn_tracker: RouteTracker) {
        let fixes = [
            GeoPoint::new(0.0, 0.002),
            GeoPoint::new(0.0, 0.006),
            GeoPoint::new(0.0, 0.0095),
            GeoPoint::new(0.0002, 0.01),
            GeoPoint::new(0.00036, 0.009),
            GeoPoint::new(0.00036, 0.005),
            GeoPoint::new(0.00036, 0.001),
        ];
        let steps: Vec<usize> = fixes
            .iter()
            .map(|fix| u_turn_tracker.locate(*fix).expect("on leg").cursor.step)
            .collect();
        assert_eq!(steps, vec![0, 0, 0, 1, 2, 2, 2]);
    }

    #[rstest]
    fn reset_returns_to_start(mut tracker: RouteTracker) {
        tracker.advance_to_leg(1).expect("leg exists");
        tracker.reset();
        assert_eq!(tracker.cursor(), RouteCursor::default());
    }
}
