//! Facade crate for the Courier delivery navigation engine.
//!
//! This crate re-exports the core domain types and exposes the OSRM routing
//! provider and the navigation session behind feature flags.

#![forbid(unsafe_code)]

pub use courier_core::{
    AnnounceError, Announcer, ArrivalController, ArrivalEvent, FixError, GeoPoint,
    GeometryTrimmer, Leg, Location, Maneuver, NearestNeighbourSequencer, OffRouteConfig,
    OffRouteMonitor, OffRouteTransition, PositionFix, Route, RouteError, RouteRequest,
    RouteSummary, RouteTracker, RoutingError, RoutingProvider, SequenceState, SilentAnnouncer,
    Step, Stop, StopSequencer, TrackError, TrimmedPath,
};
pub use courier_core::{format, geodesy};

#[cfg(feature = "osrm")]
pub use courier_routing::{OsrmRouteProvider, OsrmRouteProviderConfig, ProviderBuildError};

#[cfg(feature = "session")]
pub use courier_session::{
    NavigationEvent, NavigationSession, NavigationSnapshot, NavigationView, Navigator,
    NavigatorConfig, PositionError, PositionSource, ReplayPositionSource, RetryPolicy,
    SessionConfig, SessionError,
};
