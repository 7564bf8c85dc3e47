//! Core domain types and navigation components for the Courier engine.
//!
//! The crate is organised leaf-first: [`geodesy`] provides pure distance and
//! bearing functions, [`sequencer`] orders delivery stops, [`tracker`] keeps a
//! cursor into an immutable [`Route`], [`off_route`] classifies fixes against
//! the active leg, [`arrival`] advances through the ordered stops, and
//! [`trimmer`] builds the remaining geometry for display.
//!
//! External collaborators are expressed as traits: [`RoutingProvider`] for
//! route computation and [`Announcer`] for voice and notification delivery.

#![forbid(unsafe_code)]

pub mod announce;
pub mod arrival;
mod fix;
pub mod format;
pub mod geodesy;
pub mod off_route;
mod point;
mod route;
pub mod routing;
pub mod sequencer;
mod stop;
#[doc(hidden)]
pub mod test_support;
pub mod tracker;
pub mod trimmer;

pub use announce::{AnnounceError, Announcer, SilentAnnouncer};
pub use arrival::{ArrivalController, ArrivalEvent, SequenceState};
pub use fix::{FixError, PositionFix};
pub use off_route::{OffRouteConfig, OffRouteMonitor, OffRouteTransition};
pub use point::GeoPoint;
pub use route::{Leg, Maneuver, Route, RouteError, RouteSummary, Step};
pub use routing::{RouteRequest, RoutingError, RoutingProvider};
pub use sequencer::{NearestNeighbourSequencer, StopSequencer};
pub use stop::Stop;
pub use tracker::{Location, RouteCursor, RouteTracker, TrackError, UpcomingStep};
pub use trimmer::{GeometryTrimmer, TrimmedPath};
