//! Turn-by-turn navigation sessions for multi-stop delivery runs.
//!
//! A [`NavigationSession`] owns one run: it waits for the first position
//! fix, orders the stops, asks a [`RoutingProvider`](courier_core::RoutingProvider)
//! for a route (retrying transient failures), and then feeds every fix
//! through a [`Navigator`] on a single worker task. The outcome of each fix
//! is published as a [`NavigationSnapshot`] for the UI to render.
//!
//! The [`Navigator`] is usable on its own for synchronous embedders that
//! already serialize their fixes.

#![forbid(unsafe_code)]

mod config;
mod error;
mod messages;
mod navigator;
pub mod position;
mod retry;
mod session;
mod snapshot;

pub use config::{NavigatorConfig, RetryPolicy, SessionConfig, WatchOptions};
pub use error::{NavigatorError, SessionError};
pub use navigator::{NavigationEvent, Navigator};
pub use position::{
    FixSink, ManualPositionSource, PositionError, PositionSource, PositionUpdate,
    ReplayPositionSource, WatchId,
};
pub use retry::compute_route_with_retry;
pub use session::NavigationSession;
pub use snapshot::{CameraParams, DisplayPrefs, NavigationSnapshot, NavigationView, UpcomingTurn};
