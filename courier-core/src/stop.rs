//! Delivery stops.

use crate::GeoPoint;

/// A delivery stop on a route.
///
/// Identifiers are unique within a route. The address is display text only;
/// the engine never geocodes it.
///
/// # Examples
/// ```
/// use courier_core::{GeoPoint, Stop};
///
/// let stop = Stop::new("WB-1001", GeoPoint::new(51.5, -0.1), "1 High Street");
/// assert_eq!(stop.id, "WB-1001");
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stop {
    /// Identifier, unique within a route (a waybill number in practice).
    pub id: String,
    /// Where the stop is.
    pub location: GeoPoint,
    /// Human-readable address used in notifications.
    #[cfg_attr(feature = "serde", serde(default))]
    pub address: String,
}

impl Stop {
    /// Construct a stop.
    pub fn new(id: impl Into<String>, location: GeoPoint, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location,
            address: address.into(),
        }
    }
}
