//! Great-circle distance, bearing and point-to-segment helpers.
//!
//! All functions are pure and total. Distances are in metres on a sphere of
//! radius [`EARTH_RADIUS_M`]; bearings are in degrees clockwise from north.
#![expect(
    clippy::float_arithmetic,
    reason = "spherical geometry is inherently floating-point"
)]

use crate::GeoPoint;

/// Mean Earth radius used by every distance in the engine.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Segments shorter than this are treated as a single vertex.
const DEGENERATE_SEGMENT_M2: f64 = 1e-6;

/// Haversine distance between `a` and `b` in metres.
///
/// # Examples
/// ```
/// use courier_core::{GeoPoint, geodesy::distance};
///
/// let d = distance(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
/// assert!((d - 111_195.0).abs() < 10.0);
/// ```
#[must_use]
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let half_dlat = (b.lat - a.lat).to_radians() / 2.0;
    let half_dlng = (b.lng - a.lng).to_radians() / 2.0;

    let h = half_dlat.sin().powi(2) + lat_a.cos() * lat_b.cos() * half_dlng.sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Initial bearing from `a` towards `b`, normalised to `[0, 360)`.
///
/// # Examples
/// ```
/// use courier_core::{GeoPoint, geodesy::bearing};
///
/// let east = bearing(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
/// assert!((east - 90.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn bearing(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let y = dlng.sin() * lat_b.cos();
    let x = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * dlng.cos();
    let degrees = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if degrees >= 360.0 { 0.0 } else { degrees }
}

/// Result of projecting a point onto a segment.
#[derive(Debug, Clone, Copy)]
pub struct SegmentProjection {
    /// Closest point on the segment.
    pub point: GeoPoint,
    /// Position of [`Self::point`] along the segment in `[0, 1]`.
    pub fraction: f64,
    /// Haversine distance from the query point to [`Self::point`].
    pub distance: f64,
}

/// Project `point` onto the segment `start..end`.
///
/// The projection is computed on a local equirectangular plane centred on
/// `point`, which is accurate for segments of route-step scale (up to a few
/// kilometres). The returned distance is the haversine distance to the
/// projected point.
#[must_use]
pub fn project_onto_segment(point: GeoPoint, start: GeoPoint, end: GeoPoint) -> SegmentProjection {
    let cos_lat = point.lat.to_radians().cos();
    let to_plane = |p: GeoPoint| {
        let x = wrap_longitude(p.lng - point.lng).to_radians() * cos_lat * EARTH_RADIUS_M;
        let y = (p.lat - point.lat).to_radians() * EARTH_RADIUS_M;
        (x, y)
    };
    let (ax, ay) = to_plane(start);
    let (bx, by) = to_plane(end);
    let (dx, dy) = (bx - ax, by - ay);
    let length_sq = dx * dx + dy * dy;

    let fraction = if length_sq <= DEGENERATE_SEGMENT_M2 {
        0.0
    } else {
        (-(ax * dx + ay * dy) / length_sq).clamp(0.0, 1.0)
    };
    let projected = GeoPoint::new(
        start.lat + fraction * (end.lat - start.lat),
        start.lng + fraction * wrap_longitude(end.lng - start.lng),
    );
    SegmentProjection {
        point: projected,
        fraction,
        distance: distance(point, projected),
    }
}

/// Shortest distance from `point` to the segment `start..end` in metres.
///
/// # Examples
/// ```
/// use courier_core::{GeoPoint, geodesy::distance_to_segment};
///
/// let d = distance_to_segment(
///     GeoPoint::new(0.001, 0.5),
///     GeoPoint::new(0.0, 0.0),
///     GeoPoint::new(0.0, 1.0),
/// );
/// assert!((d - 111.2).abs() < 0.5);
/// ```
#[must_use]
pub fn distance_to_segment(point: GeoPoint, start: GeoPoint, end: GeoPoint) -> f64 {
    project_onto_segment(point, start, end).distance
}

/// Length of a polyline: the sum of its consecutive haversine distances.
#[must_use]
pub fn path_length(path: &[GeoPoint]) -> f64 {
    path.windows(2)
        .map(|pair| match pair {
            [a, b] => distance(*a, *b),
            _ => 0.0,
        })
        .sum()
}

/// Shortest distance from `point` to any segment of `path`.
///
/// A single-vertex path degrades to the point distance; an empty path yields
/// `None`.
#[must_use]
pub fn distance_to_path(point: GeoPoint, path: &[GeoPoint]) -> Option<f64> {
    match path {
        [] => None,
        [only] => Some(distance(point, *only)),
        _ => path
            .windows(2)
            .filter_map(|pair| match pair {
                [a, b] => Some(distance_to_segment(point, *a, *b)),
                _ => None,
            })
            .min_by(f64::total_cmp),
    }
}

fn wrap_longitude(delta: f64) -> f64 {
    (delta + 180.0).rem_euclid(360.0) - 180.0
}
