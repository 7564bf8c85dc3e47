//! OSRM-backed routing for the Courier engine.
//!
//! This crate provides [`OsrmRouteProvider`], an implementation of
//! [`courier_core::RoutingProvider`] that requests turn-by-turn routes from
//! an OSRM Route service and converts them into [`courier_core::Route`]s.
//!
//! # Architecture
//!
//! Stops are ordered locally before the request, so the provider always
//! asks OSRM for a route through the waypoints in the order given and never
//! uses the Trip service. Routing failures reported by OSRM in the response
//! body are mapped onto [`courier_core::RoutingError`] so the session's
//! retry policy can tell transient failures from malformed requests.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use courier_routing::{OsrmRouteProvider, OsrmRouteProviderConfig};
//!
//! let config = OsrmRouteProviderConfig::new("http://localhost:5000")
//!     .with_profile("driving")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_user_agent("my-app/1.0");
//! let provider = OsrmRouteProvider::with_config(config)?;
//! # Ok::<(), courier_routing::ProviderBuildError>(())
//! ```

#![forbid(unsafe_code)]

mod instructions;
mod osrm;
mod provider;

#[doc(hidden)]
pub mod test_support;

pub use provider::{
    DEFAULT_PROFILE, DEFAULT_USER_AGENT, OsrmRouteProvider, OsrmRouteProviderConfig,
    ProviderBuildError,
};
