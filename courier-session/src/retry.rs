//! Route computation with linear backoff.

use courier_core::{Route, RouteRequest, RoutingProvider};
use tokio_util::sync::CancellationToken;

use crate::{RetryPolicy, SessionError};

/// Ask `provider` for a route, retrying transient failures under `policy`.
///
/// Only errors for which
/// [`RoutingError::is_retryable`](courier_core::RoutingError::is_retryable)
/// holds are retried; anything else fails at once. Cancelling `cancel`
/// abandons the in-flight request or backoff wait.
///
/// # Errors
///
/// - [`SessionError::RouteUnavailable`] once every attempt has failed.
/// - [`SessionError::Routing`] for a non-retryable provider error.
/// - [`SessionError::Cancelled`] when `cancel` fires first.
pub async fn compute_route_with_retry(
    provider: &dyn RoutingProvider,
    request: &RouteRequest,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Route, SessionError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 1;
    loop {
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(SessionError::Cancelled),
            outcome = provider.compute_route(request) => outcome,
        };
        let error = match outcome {
            Ok(route) => {
                log::info!("route computed on attempt {attempt}");
                return Ok(route);
            }
            Err(error) => error,
        };
        if !error.is_retryable() {
            log::warn!("route request rejected: {error}");
            return Err(SessionError::Routing(error));
        }
        if attempt >= max_attempts {
            log::warn!("route computation failed after {attempt} attempts: {error}");
            return Err(SessionError::RouteUnavailable {
                attempts: attempt,
                last: error,
            });
        }

        let delay = policy.backoff(attempt);
        log::warn!("route attempt {attempt} of {max_attempts} failed: {error}; retrying in {delay:?}");
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(SessionError::Cancelled),
            () = tokio::time::sleep(delay) => {}
        }
        attempt = attempt.saturating_add(1);
    }
}
