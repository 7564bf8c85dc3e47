//! Error types for navigation sessions.

use courier_core::{FixError, RouteError, RoutingError, TrackError};
use thiserror::Error;

use crate::position::PositionError;

/// Reasons a navigation session failed to start or stopped abnormally.
///
/// The `Display` text is what the read model reports to the driver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// `start` was called without any stops.
    #[error("no stops to navigate to")]
    EmptyStops,
    /// A session is already starting or navigating.
    #[error("navigation is already running")]
    AlreadyRunning,
    /// The position stream failed.
    #[error("Location error: {0}")]
    Position(#[from] PositionError),
    /// Every allowed routing attempt failed.
    #[error("Failed to calculate route after multiple attempts")]
    RouteUnavailable {
        /// Attempts made.
        attempts: u32,
        /// Error from the final attempt.
        #[source]
        last: RoutingError,
    },
    /// The routing provider rejected the request outright.
    #[error("could not start navigation: {0}")]
    Routing(#[source] RoutingError),
    /// The route does not fit the requested stops.
    #[error("route does not match the stops: {0}")]
    RouteMismatch(#[from] RouteError),
    /// `stop` was called while the session was starting.
    #[error("navigation start was cancelled")]
    Cancelled,
}

/// Reasons the [`Navigator`](crate::Navigator) dropped a fix.
///
/// These never end a session; the previous state is kept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavigatorError {
    /// The fix itself is malformed.
    #[error(transparent)]
    Fix(#[from] FixError),
    /// The fix could not be matched against the route.
    #[error(transparent)]
    Track(#[from] TrackError),
    /// Every stop has already been reached.
    #[error("navigation has already completed")]
    Finished,
}
