//! Display strings for distances and durations.
//!
//! These match what drivers see in the navigation panel: whole metres below
//! a kilometre, one decimal place above, and whole minutes for times.
#![expect(
    clippy::float_arithmetic,
    reason = "display rounding works on floating-point metres and minutes"
)]

use std::time::Duration;

/// Distances below this read as "Arriving".
const ARRIVING_BELOW_M: f64 = 0.5;

/// Distance to the next maneuver: `"<n> m"`, or `"Arriving"` when at it.
///
/// # Examples
/// ```
/// use courier_core::format::format_distance_to_turn;
///
/// assert_eq!(format_distance_to_turn(123.4), "123 m");
/// assert_eq!(format_distance_to_turn(1_500.0), "1500 m");
/// assert_eq!(format_distance_to_turn(0.0), "Arriving");
/// ```
#[must_use]
pub fn format_distance_to_turn(metres: f64) -> String {
    if metres.is_finite() && metres >= ARRIVING_BELOW_M {
        format!("{:.0} m", metres.round())
    } else {
        "Arriving".to_owned()
    }
}

/// Step distance: whole metres below a kilometre, otherwise kilometres.
///
/// # Examples
/// ```
/// use courier_core::format::format_step_distance;
///
/// assert_eq!(format_step_distance(250.0), "250 m");
/// assert_eq!(format_step_distance(1_260.0), "1.3 km");
/// ```
#[must_use]
pub fn format_step_distance(metres: f64) -> String {
    if metres < 1_000.0 {
        format!("{:.0} m", metres.max(0.0).round())
    } else {
        format_kilometres(metres)
    }
}

/// Kilometres with one decimal place, e.g. `"12.3 km"`.
#[must_use]
pub fn format_kilometres(metres: f64) -> String {
    format!("{:.1} km", metres / 1_000.0)
}

/// Whole minutes, e.g. `"25 mins"`.
#[must_use]
pub fn format_duration_minutes(duration: Duration) -> String {
    format_minutes(duration.as_secs_f64() / 60.0)
}

/// Estimated time to arrival: `"<n> mins"`, or empty when unknown or zero.
///
/// # Examples
/// ```
/// use courier_core::format::format_eta_minutes;
///
/// assert_eq!(format_eta_minutes(4.6), "5 mins");
/// assert_eq!(format_eta_minutes(0.0), "");
/// assert_eq!(format_eta_minutes(f64::INFINITY), "");
/// ```
#[must_use]
pub fn format_eta_minutes(minutes: f64) -> String {
    if minutes.is_finite() && minutes > 0.0 {
        format_minutes(minutes)
    } else {
        String::new()
    }
}

fn format_minutes(minutes: f64) -> String {
    format!("{:.0} mins", minutes.max(0.0).round())
}
