//! Instruction text and maneuver tags from OSRM maneuvers.
//!
//! OSRM reports a maneuver as a `type` plus an optional direction
//! `modifier`. The engine wants a [`Maneuver`] tag and a sentence for the
//! driver, so both are derived here. Unknown types fall back to a plain
//! "Continue" with [`Maneuver::Straight`].

use courier_core::Maneuver;

use crate::osrm::OsrmManeuver;

/// Map an OSRM maneuver to a tag.
pub fn maneuver_tag(maneuver: &OsrmManeuver) -> Maneuver {
    let modifier = maneuver.modifier.as_deref().unwrap_or("straight");
    match maneuver.kind.as_str() {
        "depart" => Maneuver::Depart,
        "arrive" => Maneuver::Arrive,
        "merge" => Maneuver::Merge,
        "roundabout" | "rotary" | "roundabout turn" | "exit roundabout" | "exit rotary" => {
            if modifier.contains("left") {
                Maneuver::RoundaboutLeft
            } else {
                Maneuver::RoundaboutRight
            }
        }
        "fork" => sided(modifier, Maneuver::ForkLeft, Maneuver::ForkRight),
        "on ramp" | "off ramp" => sided(modifier, Maneuver::RampLeft, Maneuver::RampRight),
        "continue" | "new name" => match modifier {
            "slight left" => Maneuver::KeepLeft,
            "slight right" => Maneuver::KeepRight,
            other => turn(other),
        },
        _ => turn(modifier),
    }
}

fn sided(modifier: &str, left: Maneuver, right: Maneuver) -> Maneuver {
    if modifier.contains("left") {
        left
    } else if modifier.contains("right") {
        right
    } else {
        Maneuver::Straight
    }
}

fn turn(modifier: &str) -> Maneuver {
    match modifier {
        "uturn" => Maneuver::UTurn,
        "sharp left" => Maneuver::TurnSharpLeft,
        "left" => Maneuver::TurnLeft,
        "slight left" => Maneuver::TurnSlightLeft,
        "sharp right" => Maneuver::TurnSharpRight,
        "right" => Maneuver::TurnRight,
        "slight right" => Maneuver::TurnSlightRight,
        _ => Maneuver::Straight,
    }
}

/// Compose the driver-facing instruction for a step on road `name`.
pub fn instruction(maneuver: &OsrmManeuver, name: &str) -> String {
    let modifier = maneuver.modifier.as_deref();
    let base = match maneuver.kind.as_str() {
        "depart" => "Depart".to_owned(),
        "arrive" => return "Arrive at your destination".to_owned(),
        "merge" => "Merge".to_owned(),
        "on ramp" => "Take the ramp".to_owned(),
        "off ramp" => "Take the exit".to_owned(),
        "fork" => match modifier {
            Some(side) => format!("Keep {side} at the fork"),
            None => "Continue at the fork".to_owned(),
        },
        "roundabout" | "rotary" => match maneuver.exit {
            Some(exit) => format!("At the roundabout, take exit {exit}"),
            None => "Enter the roundabout".to_owned(),
        },
        "exit roundabout" | "exit rotary" => "Exit the roundabout".to_owned(),
        "turn" | "end of road" | "roundabout turn" => match modifier {
            Some("uturn") => "Make a U-turn".to_owned(),
            Some("straight") | None => "Go straight".to_owned(),
            Some(direction) => format!("Turn {direction}"),
        },
        _ => match modifier {
            Some("uturn") => "Make a U-turn".to_owned(),
            Some(direction) if direction != "straight" => format!("Continue {direction}"),
            _ => "Continue".to_owned(),
        },
    };
    if name.is_empty() {
        base
    } else {
        format!("{base} onto {name}")
    }
}
