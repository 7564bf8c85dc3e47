//! Driver-facing announcement texts and best-effort delivery.

use courier_core::Announcer;

pub const STARTING_SPOKEN: &str = "Starting navigation";
pub const STARTING_TITLE: &str = "Starting Navigation";
pub const ARRIVED_TITLE: &str = "Arrived at Stop";
pub const ARRIVED_SPOKEN: &str = "You have arrived at your destination";
pub const CONTINUING_TITLE: &str = "Continuing to Next Stop";
pub const CONTINUING_SPOKEN: &str = "Continuing to next stop";
pub const COMPLETE_TITLE: &str = "Navigation Complete";
pub const COMPLETE_BODY: &str = "You have reached your final destination";
pub const OFF_ROUTE_SPOKEN: &str = "You are off route";

pub fn starting_body(address: &str, estimated: &str) -> String {
    format!("Navigating to {address}\nEstimated time: {estimated}")
}

pub fn arrived_body(address: &str) -> String {
    format!("You have arrived at: {address}")
}

pub fn next_stop_body(address: &str) -> String {
    format!("Next stop: {address}")
}

/// Speak `text` unless voice guidance is off. Failures are logged only.
pub fn speak(announcer: &dyn Announcer, voice_enabled: bool, text: &str) {
    if !voice_enabled {
        return;
    }
    if let Err(err) = announcer.announce(text) {
        log::warn!("announcement {text:?} not delivered: {err}");
    }
}

/// Show a notification. Failures are logged only.
pub fn notify(announcer: &dyn Announcer, title: &str, body: &str) {
    if let Err(err) = announcer.notify(title, body) {
        log::warn!("notification {title:?} not delivered: {err}");
    }
}
