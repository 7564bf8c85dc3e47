//! Route requests and the provider trait.

use async_trait::async_trait;

use super::RoutingError;
use crate::{GeoPoint, Route, Stop};

/// A request for a route through ordered waypoints.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    /// Where the route starts, usually the driver's current position.
    pub origin: GeoPoint,
    /// Intermediate stops in visiting order.
    pub waypoints: Vec<GeoPoint>,
    /// The final stop.
    pub destination: GeoPoint,
    /// Whether the provider may reorder waypoints.
    ///
    /// Always `false` for requests built by the engine, which orders stops
    /// itself.
    pub optimize_waypoints: bool,
}

impl RouteRequest {
    /// Build a request visiting `stops` in order from `origin`.
    ///
    /// The last stop becomes the destination and the rest become waypoints,
    /// so the returned route has one leg per stop.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::EmptyStops`] when `stops` is empty.
    pub fn through_stops(origin: GeoPoint, stops: &[Stop]) -> Result<Self, RoutingError> {
        let (last, rest) = stops.split_last().ok_or(RoutingError::EmptyStops)?;
        Ok(Self {
            origin,
            waypoints: rest.iter().map(|stop| stop.location).collect(),
            destination: last.location,
            optimize_waypoints: false,
        })
    }

    /// Every point of the request in travel order: origin, waypoints, destination.
    pub fn points(&self) -> impl Iterator<Item = GeoPoint> + '_ {
        std::iter::once(self.origin)
            .chain(self.waypoints.iter().copied())
            .chain(std::iter::once(self.destination))
    }

    /// Number of legs a conforming route must contain.
    #[must_use]
    pub fn leg_count(&self) -> usize {
        self.waypoints.len().saturating_add(1)
    }
}

/// Compute routes through ordered waypoints.
///
/// Implementations must preserve the caller's waypoint order when
/// [`RouteRequest::optimize_waypoints`] is `false`, and return a route with
/// [`RouteRequest::leg_count`] legs where leg `i` ends at waypoint `i` (or
/// the destination for the last leg).
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Compute a route for `request`.
    async fn compute_route(&self, request: &RouteRequest) -> Result<Route, RoutingError>;
}
