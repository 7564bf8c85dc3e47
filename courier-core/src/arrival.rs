//! Arrival detection and stop sequencing.
//!
//! [`ArrivalController`] is a two-state machine over the ordered stops:
//! `EnRoute(i)` while heading for stop `i`, and `Completed` after the last
//! stop is reached. It only ever moves forward; driving back past a stop
//! that has already been reached does nothing.

use crate::geodesy::distance;
use crate::{GeoPoint, Stop};

/// Default radius, in metres, within which a stop counts as reached.
pub const DEFAULT_ARRIVAL_RADIUS_M: f64 = 50.0;

/// Where the controller is in the stop sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SequenceState {
    /// Heading for the stop at this index.
    EnRoute(usize),
    /// Every stop has been reached.
    Completed,
}

/// A transition produced by [`ArrivalController::update`].
#[derive(Debug, Clone)]
pub enum ArrivalEvent {
    /// A stop was reached and another remains.
    Advanced {
        /// The stop just reached.
        arrived: Stop,
        /// The stop now being headed for.
        next: Stop,
    },
    /// The last stop was reached.
    Completed {
        /// The final stop.
        arrived: Stop,
    },
}

impl ArrivalEvent {
    /// The stop reached by this event.
    #[must_use]
    pub const fn arrived(&self) -> &Stop {
        match self {
            Self::Advanced { arrived, .. } | Self::Completed { arrived } => arrived,
        }
    }
}

/// Detects arrival at the current stop and advances through the sequence.
///
/// # Examples
/// ```
/// use courier_core::{ArrivalController, ArrivalEvent, GeoPoint, SequenceState, Stop};
///
/// let stops = vec![
///     Stop::new("s0", GeoPoint::new(0.0, 0.01), "1 Quay"),
///     Stop::new("s1", GeoPoint::new(0.0, 0.02), "2 Quay"),
/// ];
/// let mut controller = ArrivalController::new(stops, 50.0);
///
/// let event = controller.update(GeoPoint::new(0.0, 0.0101));
/// assert!(matches!(event, Some(ArrivalEvent::Advanced { .. })));
/// assert_eq!(controller.state(), SequenceState::EnRoute(1));
///
/// // Still near s0: nothing happens.
/// assert!(controller.update(GeoPoint::new(0.0, 0.0101)).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ArrivalController {
    stops: Vec<Stop>,
    radius_m: f64,
    state: SequenceState,
}

impl ArrivalController {
    /// Create a controller heading for the first of `stops`.
    ///
    /// An empty stop list starts in [`SequenceState::Completed`].
    #[must_use]
    pub fn new(stops: Vec<Stop>, radius_m: f64) -> Self {
        let state = if stops.is_empty() {
            SequenceState::Completed
        } else {
            SequenceState::EnRoute(0)
        };
        Self {
            stops,
            radius_m,
            state,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SequenceState {
        self.state
    }

    /// The ordered stops.
    #[must_use]
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// The stop being headed for, if any.
    #[must_use]
    pub fn current_stop(&self) -> Option<&Stop> {
        match self.state {
            SequenceState::EnRoute(index) => self.stops.get(index),
            SequenceState::Completed => None,
        }
    }

    /// Whether every stop has been reached.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.state, SequenceState::Completed)
    }

    /// Check `position` against the current stop and advance on arrival.
    ///
    /// Only the current stop is considered, so re-entering the radius of an
    /// earlier stop is a no-op, as is any update after completion.
    pub fn update(&mut self, position: GeoPoint) -> Option<ArrivalEvent> {
        let SequenceState::EnRoute(index) = self.state else {
            return None;
        };
        let current = self.stops.get(index)?;
        if distance(position, current.location) > self.radius_m {
            return None;
        }

        let arrived = current.clone();
        let next_index = index.saturating_add(1);
        if let Some(next) = self.stops.get(next_index) {
            log::info!("arrived at stop {} ({}); next is {}", arrived.id, index, next.id);
            let event = ArrivalEvent::Advanced {
                arrived,
                next: next.clone(),
            };
            self.state = SequenceState::EnRoute(next_index);
            Some(event)
        } else {
            log::info!("arrived at final stop {}", arrived.id);
            self.state = SequenceState::Completed;
            Some(ArrivalEvent::Completed { arrived })
        }
    }

    /// Return to the first stop.
    pub fn reset(&mut self) {
        self.state = if self.stops.is_empty() {
            SequenceState::Completed
        } else {
            SequenceState::EnRoute(0)
        };
    }
}
