//! The read model published after every change.

use courier_core::format::{format_distance_to_turn, format_eta_minutes, format_step_distance};
use courier_core::{
    GeoPoint, Maneuver, RouteSummary, SequenceState, Stop, TrimmedPath, UpcomingStep,
};
use serde::{Deserialize, Serialize};

use crate::Navigator;

/// Zoom used while following the vehicle.
pub const NAVIGATION_ZOOM: u8 = 18;
/// Camera tilt, in degrees, while following the vehicle.
pub const NAVIGATION_TILT: u8 = 45;
/// Zoom used for the whole-route view.
pub const OVERVIEW_ZOOM: u8 = 14;

/// How the map should frame the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationView {
    /// The whole route, north up.
    #[default]
    Overview,
    /// Close behind the vehicle, facing its heading.
    Navigation,
}

impl NavigationView {
    /// The other view.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Overview => Self::Navigation,
            Self::Navigation => Self::Overview,
        }
    }
}

/// Camera settings for the display surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CameraParams {
    /// Point to centre on.
    pub center: GeoPoint,
    /// Map zoom level.
    pub zoom: u8,
    /// Tilt in degrees.
    pub tilt: u8,
    /// Map rotation in degrees from north.
    pub heading: f64,
}

impl CameraParams {
    /// Camera for `view` centred on `center`.
    #[must_use]
    pub fn for_view(view: NavigationView, center: GeoPoint, heading: Option<f64>) -> Self {
        match view {
            NavigationView::Navigation => Self {
                center,
                zoom: NAVIGATION_ZOOM,
                tilt: NAVIGATION_TILT,
                heading: heading.unwrap_or_default(),
            },
            NavigationView::Overview => Self {
                center,
                zoom: OVERVIEW_ZOOM,
                tilt: 0,
                heading: 0.0,
            },
        }
    }
}

/// A maneuver after the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingTurn {
    /// Instruction text.
    pub instruction: String,
    /// Length of the step, e.g. `"250 m"` or `"1.3 km"`.
    pub distance: String,
    /// Maneuver tag.
    pub maneuver: Maneuver,
}

impl From<&UpcomingStep> for UpcomingTurn {
    fn from(step: &UpcomingStep) -> Self {
        Self {
            instruction: step.instruction.clone(),
            distance: format_step_distance(step.distance_m),
            maneuver: step.maneuver,
        }
    }
}

/// UI choices that survive across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPrefs {
    /// Current map framing.
    pub view: NavigationView,
    /// Whether spoken guidance is on.
    pub voice_enabled: bool,
}

impl Default for DisplayPrefs {
    fn default() -> Self {
        Self {
            view: NavigationView::Overview,
            voice_enabled: true,
        }
    }
}

/// Everything the UI needs to draw the navigation panel and map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSnapshot {
    /// Whether a route is being followed.
    pub is_navigating: bool,
    /// Instruction for the current step.
    pub next_maneuver: String,
    /// Distance to the end of the current step, e.g. `"120 m"` or `"Arriving"`.
    pub distance_to_next_turn: String,
    /// Time to the current stop, e.g. `"4 mins"`; empty when unknown.
    pub estimated_time_to_arrival: String,
    /// Speed between the last two fixes.
    pub current_speed_kmh: f64,
    /// Whether the vehicle is off the active leg.
    pub is_off_route: bool,
    /// Up to three maneuvers after the current one.
    pub upcoming_turns: Vec<UpcomingTurn>,
    /// Current map framing.
    pub navigation_view: NavigationView,
    /// Camera for the display surface, once a position is known.
    pub camera: Option<CameraParams>,
    /// Whether spoken guidance is on.
    pub voice_enabled: bool,
    /// Share of the current leg driven, in `[0, 1]`.
    pub leg_progress: f64,
    /// Stop being headed for.
    pub current_stop: Option<Stop>,
    /// Index of that stop in visiting order.
    pub stop_index: Option<usize>,
    /// Number of stops in the run.
    pub stop_count: usize,
    /// Direction of travel in degrees from north.
    pub heading: Option<f64>,
    /// Remaining geometry of the current leg.
    pub remaining_path: Option<TrimmedPath>,
    /// Last fatal error, until the next start.
    pub error: Option<String>,
    /// Route totals for the run.
    pub summary: Option<RouteSummary>,
}

impl NavigationSnapshot {
    /// Snapshot for a session that is not navigating.
    #[must_use]
    pub fn idle(prefs: DisplayPrefs, error: Option<String>) -> Self {
        Self {
            navigation_view: prefs.view,
            voice_enabled: prefs.voice_enabled,
            error,
            ..Self::default()
        }
    }

    /// Snapshot of an active `navigator`.
    #[must_use]
    pub fn navigating(navigator: &Navigator, prefs: DisplayPrefs) -> Self {
        let location = navigator.location();
        let stop_index = match navigator.sequence_state() {
            SequenceState::EnRoute(index) => Some(index),
            SequenceState::Completed => None,
        };
        Self {
            is_navigating: true,
            next_maneuver: navigator
                .current_step()
                .map(|step| step.instruction.clone())
                .unwrap_or_default(),
            distance_to_next_turn: location
                .map(|l| format_distance_to_turn(l.distance_to_step_end_m))
                .unwrap_or_default(),
            estimated_time_to_arrival: navigator
                .eta_minutes()
                .map(format_eta_minutes)
                .unwrap_or_default(),
            current_speed_kmh: navigator.speed_kmh(),
            is_off_route: navigator.is_off_route(),
            upcoming_turns: location
                .map(|l| l.upcoming.iter().map(UpcomingTurn::from).collect())
                .unwrap_or_default(),
            navigation_view: prefs.view,
            camera: navigator
                .position()
                .map(|center| CameraParams::for_view(prefs.view, center, navigator.heading())),
            voice_enabled: prefs.voice_enabled,
            leg_progress: navigator.leg_progress(),
            current_stop: navigator.current_stop().cloned(),
            stop_index,
            stop_count: navigator.stops().len(),
            heading: navigator.heading(),
            remaining_path: navigator.remaining_path().cloned(),
            error: None,
            summary: Some(navigator.route().summary()),
        }
    }
}
