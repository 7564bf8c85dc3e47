//! Raw position fixes from a location stream.

use std::time::Duration;

use thiserror::Error;

use crate::GeoPoint;

/// A single reading from the platform location service.
///
/// Timestamps are optional and measured on any monotonic clock shared by the
/// fixes of one stream; they only feed speed estimation.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use courier_core::PositionFix;
///
/// let fix = PositionFix::new(51.5, -0.1)
///     .with_accuracy(5.0)
///     .with_timestamp(Duration::from_secs(12));
/// assert!(fix.position().is_ok());
/// ```
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionFix {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Reported horizontal accuracy in metres.
    #[cfg_attr(feature = "serde", serde(default))]
    pub accuracy_m: Option<f64>,
    /// Time the fix was taken.
    #[cfg_attr(feature = "serde", serde(default))]
    pub timestamp: Option<Duration>,
}

/// Reasons a fix is rejected before it reaches the navigation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FixError {
    /// Latitude or longitude is NaN or infinite.
    #[error("fix coordinates are not finite")]
    NonFinite,
    /// Coordinates fall outside the WGS84 ranges.
    #[error("fix coordinates ({lat}, {lng}) are out of range")]
    OutOfRange {
        /// Reported latitude.
        lat: f64,
        /// Reported longitude.
        lng: f64,
    },
    /// Accuracy is negative or not finite.
    #[error("fix accuracy {0} is invalid")]
    InvalidAccuracy(f64),
}

impl PositionFix {
    /// Construct a fix without accuracy or timestamp.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            accuracy_m: None,
            timestamp: None,
        }
    }

    /// Attach a horizontal accuracy.
    #[must_use]
    pub const fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    /// Attach a timestamp.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: Duration) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Validate the fix and return its position.
    ///
    /// # Errors
    ///
    /// Returns [`FixError`] for non-finite or out-of-range coordinates and
    /// for a negative or non-finite accuracy.
    pub fn position(&self) -> Result<GeoPoint, FixError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(FixError::NonFinite);
        }
        let point = GeoPoint::new(self.lat, self.lng);
        if !point.is_valid() {
            return Err(FixError::OutOfRange {
                lat: self.lat,
                lng: self.lng,
            });
        }
        if let Some(accuracy) = self.accuracy_m
            && !(accuracy.is_finite() && accuracy >= 0.0)
        {
            return Err(FixError::InvalidAccuracy(accuracy));
        }
        Ok(point)
    }
}

impl From<GeoPoint> for PositionFix {
    fn from(point: GeoPoint) -> Self {
        Self::new(point.lat, point.lng)
    }
}
