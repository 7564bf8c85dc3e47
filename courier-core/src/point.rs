//! WGS84 coordinate value type.

use geo::{Coord, Point};

/// A WGS84 position in degrees.
///
/// Points are plain values. Two points are "the same place" only by way of
/// [`crate::geodesy::distance`]; the type deliberately has no `PartialEq`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use courier_core::GeoPoint;
///
/// let point = GeoPoint::new(51.5, -0.1);
/// let coord: Coord<f64> = point.into();
/// assert_eq!(coord.x, -0.1);
/// assert_eq!(coord.y, 51.5);
/// ```
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl GeoPoint {
    /// Construct a point from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and inside the WGS84 ranges.
    ///
    /// # Examples
    /// ```
    /// use courier_core::GeoPoint;
    ///
    /// assert!(GeoPoint::new(45.0, 90.0).is_valid());
    /// assert!(!GeoPoint::new(91.0, 0.0).is_valid());
    /// assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    /// ```
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<GeoPoint> for Coord<f64> {
    fn from(point: GeoPoint) -> Self {
        Self {
            x: point.lng,
            y: point.lat,
        }
    }
}

impl From<Coord<f64>> for GeoPoint {
    fn from(coord: Coord<f64>) -> Self {
        Self::new(coord.y, coord.x)
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(point: GeoPoint) -> Self {
        Self::new(point.lng, point.lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn coord_round_trip_swaps_axes() {
        let coord: Coord<f64> = GeoPoint::new(10.0, 20.0).into();
        assert_eq!(coord, Coord { x: 20.0, y: 10.0 });
        let back = GeoPoint::from(coord);
        assert_eq!((back.lat, back.lng), (10.0, 20.0));
    }

    #[rstest]
    #[case(-90.0, -180.0, true)]
    #[case(90.0, 180.0, true)]
    #[case(-90.1, 0.0, false)]
    #[case(0.0, 180.5, false)]
    #[case(f64::INFINITY, 0.0, false)]
    fn validity_respects_wgs84_ranges(#[case] lat: f64, #[case] lng: f64, #[case] valid: bool) {
        assert_eq!(GeoPoint::new(lat, lng).is_valid(), valid);
    }
}
