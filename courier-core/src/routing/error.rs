//! Errors reported by routing providers.

use thiserror::Error;

/// Errors from [`super::RoutingProvider::compute_route`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The request named no stops.
    #[error("at least one stop is required to compute a route")]
    EmptyStops,
    /// The provider found no drivable route between the waypoints.
    #[error("no route found: {message}")]
    NoRouteFound {
        /// Provider-supplied detail.
        message: String,
    },
    /// The provider could not be reached or failed internally.
    ///
    /// Covers transport failures, timeouts, HTTP errors and malformed
    /// responses.
    #[error("routing provider unavailable: {message}")]
    ProviderUnavailable {
        /// Description of the failure.
        message: String,
    },
    /// The provider rejected the request as malformed.
    #[error("invalid routing request: {message}")]
    InvalidRequest {
        /// Provider-supplied detail.
        message: String,
    },
    /// The provider returned a route that violates the route invariants.
    #[error("routing provider returned an invalid route: {0}")]
    InvalidRoute(#[from] crate::RouteError),
}

impl RoutingError {
    /// Whether a retry may succeed.
    ///
    /// Missing routes and unavailable providers are transient from the
    /// session's point of view; malformed requests and routes are not.
    ///
    /// # Examples
    /// ```
    /// use courier_core::RoutingError;
    ///
    /// let err = RoutingError::ProviderUnavailable { message: "timeout".into() };
    /// assert!(err.is_retryable());
    /// assert!(!RoutingError::EmptyStops.is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NoRouteFound { .. } | Self::ProviderUnavailable { .. }
        )
    }
}
