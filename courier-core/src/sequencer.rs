//! Visiting order for delivery stops.
//!
//! [`NearestNeighbourSequencer`] is a greedy heuristic: from the current
//! point it always drives to the closest unvisited stop. It runs in `O(n²)`
//! for `n` stops, which is fine for delivery rounds of tens of stops. It is
//! not an optimal travelling-salesman solver; on some layouts it leaves a
//! long closing leg back across the area, and that trade-off is accepted.

use crate::geodesy::distance;
use crate::{GeoPoint, Stop};

/// Decide the order in which stops are visited.
///
/// Sequencers must be `Send + Sync` so a session can share them across tasks.
pub trait StopSequencer: Send + Sync {
    /// Return indices into `stops` in visiting order, starting at `start`.
    ///
    /// The result must be a permutation of `0..stops.len()`.
    fn order(&self, start: GeoPoint, stops: &[Stop]) -> Vec<usize>;

    /// Reorder `stops` according to [`Self::order`].
    fn sequence(&self, start: GeoPoint, stops: Vec<Stop>) -> Vec<Stop> {
        let order = self.order(start, &stops);
        let mut slots: Vec<Option<Stop>> = stops.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|index| slots.get_mut(index).and_then(Option::take))
            .collect()
    }
}

/// Greedy nearest-neighbour ordering.
///
/// Ties are broken in favour of the stop that appears first in the input, so
/// the result is deterministic for a fixed input order.
///
/// # Examples
/// ```
/// use courier_core::{GeoPoint, NearestNeighbourSequencer, Stop, StopSequencer};
///
/// let stops = vec![
///     Stop::new("A", GeoPoint::new(0.0, 1.0), ""),
///     Stop::new("B", GeoPoint::new(0.0, 3.0), ""),
///     Stop::new("C", GeoPoint::new(0.0, 2.0), ""),
/// ];
/// let ordered = NearestNeighbourSequencer.sequence(GeoPoint::new(0.0, 0.0), stops);
/// let ids: Vec<_> = ordered.iter().map(|s| s.id.as_str()).collect();
/// assert_eq!(ids, ["A", "C", "B"]);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct NearestNeighbourSequencer;

impl StopSequencer for NearestNeighbourSequencer {
    fn order(&self, start: GeoPoint, stops: &[Stop]) -> Vec<usize> {
        let mut unvisited: Vec<usize> = (0..stops.len()).collect();
        let mut order = Vec::with_capacity(stops.len());
        let mut current = start;

        while let Some((slot, index, location)) = nearest_unvisited(current, stops, &unvisited) {
            unvisited.remove(slot);
            order.push(index);
            current = location;
        }
        log::debug!("sequenced {} stops: {order:?}", stops.len());
        order
    }
}

/// Find the closest unvisited stop as `(slot in unvisited, stop index, location)`.
fn nearest_unvisited(
    from: GeoPoint,
    stops: &[Stop],
    unvisited: &[usize],
) -> Option<(usize, usize, GeoPoint)> {
    let mut best: Option<(usize, usize, GeoPoint, f64)> = None;
    for (slot, &index) in unvisited.iter().enumerate() {
        let Some(stop) = stops.get(index) else {
            continue;
        };
        let candidate = distance(from, stop.location);
        // Strictly-less keeps the first-seen stop on ties; total_cmp sorts NaN last.
        if best.is_none_or(|(.., best_distance)| candidate.total_cmp(&best_distance).is_lt()) {
            best = Some((slot, index, stop.location, candidate));
        }
    }
    best.map(|(slot, index, location, _)| (slot, index, location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn stop(id: &str, lat: f64, lng: f64) -> Stop {
        Stop::new(id, GeoPoint::new(lat, lng), format!("{id} street"))
    }

    fn ids(stops: &[Stop]) -> Vec<&str> {
        stops.iter().map(|s| s.id.as_str()).collect()
    }

    #[rstest]
    fn empty_input_yields_empty_order() {
        let order = NearestNeighbourSequencer.order(GeoPoint::new(0.0, 0.0), &[]);
        assert!(order.is_empty());
    }

    #[rstest]
    fn single_stop_is_returned_unchanged() {
        let stops = vec![stop("only", 5.0, 5.0)];
        let ordered = NearestNeighbourSequencer.sequence(GeoPoint::new(0.0, 0.0), stops);
        assert_eq!(ids(&ordered), ["only"]);
    }

    #[rstest]
    fn picks_nearest_remaining_each_time() {
        let stops = vec![stop("A", 0.0, 1.0), stop("B", 0.0, 3.0), stop("C", 0.0, 2.0)];
        let order = NearestNeighbourSequencer.order(GeoPoint::new(0.0, 0.0), &stops);
        assert_eq!(order, [0, 2, 1]);
    }

    #[rstest]
    fn ties_resolve_to_first_seen() {
        let stops = vec![stop("east", 0.0, 1.0), stop("west", 0.0, -1.0)];
        let ordered = NearestNeighbourSequencer.sequence(GeoPoint::new(0.0, 0.0), stops);
        assert_eq!(ids(&ordered), ["east", "west"]);
    }

    #[rstest]
    fn starts_from_the_given_location() {
        let stops = vec![stop("near-origin", 0.0, 0.1), stop("far", 0.0, 5.0)];
        let ordered = NearestNeighbourSequencer.sequence(GeoPoint::new(0.0, 5.1), stops);
        assert_eq!(ids(&ordered), ["far", "near-origin"]);
    }
}
