//! Contract for the external routing provider.
//!
//! The engine never routes over a road graph itself. It orders stops locally,
//! hands them to a [`RoutingProvider`] as waypoints with
//! `optimize_waypoints = false`, and navigates whatever [`crate::Route`]
//! comes back.
//!
//! # Example
//!
//! ```
//! use courier_core::{GeoPoint, RouteRequest, RoutingProvider, Stop};
//! use courier_core::test_support::StraightLineRouteProvider;
//!
//! # tokio_test_block(async {
//! let stops = vec![
//!     Stop::new("a", GeoPoint::new(0.0, 0.01), "1 Mill Lane"),
//!     Stop::new("b", GeoPoint::new(0.0, 0.02), "2 Mill Lane"),
//! ];
//! let request = RouteRequest::through_stops(GeoPoint::new(0.0, 0.0), &stops)?;
//! let route = StraightLineRouteProvider::default().compute_route(&request).await?;
//! assert_eq!(route.legs().len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().expect("runtime").block_on(f)
//! # }
//! ```

mod error;
mod provider;

pub use error::RoutingError;
pub use provider::{RouteRequest, RoutingProvider};
