//! Test utilities for routing providers.
//!
//! This module provides [`StubRouteProvider`], a deterministic test double
//! for [`RoutingProvider`] that plays back scripted responses without making
//! HTTP requests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use courier_core::{Route, RouteRequest, RoutingError, RoutingProvider};

/// Stub `RoutingProvider` for testing.
///
/// Responses are returned in script order; once the script is exhausted the
/// last response repeats. Every call is counted, including those rejected
/// for an empty request.
///
/// # Example
///
/// ```
/// use courier_core::{GeoPoint, RouteRequest, RoutingError, RoutingProvider, Stop};
/// use courier_core::test_support::straight_route;
/// use courier_routing::test_support::StubRouteProvider;
///
/// let stops = [Stop::new("a", GeoPoint::new(0.0, 0.01), "A")];
/// let route = straight_route(GeoPoint::new(0.0, 0.0), &stops, 2);
/// let provider = StubRouteProvider::scripted(vec![
///     Err(RoutingError::ProviderUnavailable { message: "warming up".into() }),
///     Ok(route),
/// ]);
/// let request = RouteRequest::through_stops(GeoPoint::new(0.0, 0.0), &stops)?;
///
/// let runtime = tokio::runtime::Builder::new_current_thread().build()?;
/// assert!(runtime.block_on(provider.compute_route(&request)).is_err());
/// assert!(runtime.block_on(provider.compute_route(&request)).is_ok());
/// assert_eq!(provider.calls(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct StubRouteProvider {
    script: Mutex<VecDeque<Result<Route, RoutingError>>>,
    calls: AtomicUsize,
}

impl StubRouteProvider {
    /// Create a provider that always returns `route`.
    #[must_use]
    pub fn with_route(route: Route) -> Self {
        Self::scripted(vec![Ok(route)])
    }

    /// Create a provider that always returns `error`.
    #[must_use]
    pub fn with_error(error: RoutingError) -> Self {
        Self::scripted(vec![Err(error)])
    }

    /// Create a provider that plays `responses` in order, repeating the last.
    ///
    /// An empty script behaves like [`RoutingError::ProviderUnavailable`].
    #[must_use]
    pub fn scripted(responses: Vec<Result<Route, RoutingError>>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `compute_route` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> Result<Route, RoutingError> {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        let response = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        response.unwrap_or_else(|| {
            Err(RoutingError::ProviderUnavailable {
                message: "stub provider has no scripted responses".to_owned(),
            })
        })
    }
}

#[async_trait]
impl RoutingProvider for StubRouteProvider {
    async fn compute_route(&self, request: &RouteRequest) -> Result<Route, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.optimize_waypoints {
            return Err(RoutingError::InvalidRequest {
                message: "stub provider preserves waypoint order".to_owned(),
            });
        }
        self.next_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::test_support::straight_route;
    use courier_core::{GeoPoint, Stop};
    use rstest::{fixture, rstest};

    #[fixture]
    fn stops() -> Vec<Stop> {
        vec![Stop::new("a", GeoPoint::new(0.0, 0.01), "A")]
    }

    fn request(stops: &[Stop]) -> RouteRequest {
        RouteRequest::through_stops(GeoPoint::new(0.0, 0.0), stops).expect("stops")
    }

    #[rstest]
    #[tokio::test]
    async fn with_route_returns_configured_route(stops: Vec<Stop>) {
        let provider =
            StubRouteProvider::with_route(straight_route(GeoPoint::new(0.0, 0.0), &stops, 2));

        for _ in 0..3 {
            let route = provider.compute_route(&request(&stops)).await.expect("should succeed");
            assert_eq!(route.legs().len(), 1);
        }
        assert_eq!(provider.calls(), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn with_error_returns_configured_error(stops: Vec<Stop>) {
        let provider = StubRouteProvider::with_error(RoutingError::NoRouteFound {
            message: "island".to_owned(),
        });

        let err = provider.compute_route(&request(&stops)).await.expect_err("should fail");

        assert!(matches!(err, RoutingError::NoRouteFound { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn script_repeats_last_response(stops: Vec<Stop>) {
        let route = straight_route(GeoPoint::new(0.0, 0.0), &stops, 2);
        let provider = StubRouteProvider::scripted(vec![
            Err(RoutingError::EmptyStops),
            Ok(route.clone()),
        ]);

        assert!(provider.compute_route(&request(&stops)).await.is_err());
        assert!(provider.compute_route(&request(&stops)).await.is_ok());
        assert!(provider.compute_route(&request(&stops)).await.is_ok());
    }

    #[rstest]
    #[tokio::test]
    async fn empty_script_reports_unavailable(stops: Vec<Stop>) {
        let provider = StubRouteProvider::scripted(Vec::new());

        let err = provider.compute_route(&request(&stops)).await.expect_err("should fail");

        assert!(err.is_retryable());
    }
}
