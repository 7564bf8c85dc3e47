//! Off-route classification against the active leg.
//!
//! The monitor measures the shortest distance from a position to any segment
//! of any step in the current leg, not just the matched step. A fix farther
//! than [`OffRouteConfig::threshold_m`] counts as off-route.
//!
//! With the default `dwell_fixes` of 1 a single crossing flips the flag. A
//! larger value requires that many consecutive fixes on the far side of the
//! threshold before the flag changes, which suppresses flapping on noisy
//! fixes.

use crate::geodesy::distance_to_path;
use crate::{GeoPoint, Leg};

/// Default distance beyond which a fix is off-route.
pub const DEFAULT_OFF_ROUTE_THRESHOLD_M: f64 = 100.0;

/// Off-route tuning.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffRouteConfig {
    /// Distance from the leg, in metres, beyond which a fix is off-route.
    pub threshold_m: f64,
    /// Consecutive fixes required before the flag changes. Zero acts as one.
    pub dwell_fixes: u32,
}

impl Default for OffRouteConfig {
    fn default() -> Self {
        Self {
            threshold_m: DEFAULT_OFF_ROUTE_THRESHOLD_M,
            dwell_fixes: 1,
        }
    }
}

impl OffRouteConfig {
    /// Set the off-route threshold.
    #[must_use]
    pub const fn with_threshold(mut self, threshold_m: f64) -> Self {
        self.threshold_m = threshold_m;
        self
    }

    /// Set the dwell count.
    #[must_use]
    pub const fn with_dwell_fixes(mut self, dwell_fixes: u32) -> Self {
        self.dwell_fixes = dwell_fixes;
        self
    }
}

/// Outcome of feeding one fix to the monitor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OffRouteTransition {
    /// The flag did not change.
    Unchanged,
    /// The vehicle has just left the route.
    LeftRoute {
        /// Distance from the leg at the time of the transition.
        distance_m: f64,
    },
    /// The vehicle has just come back onto the route.
    Rejoined,
}

/// Tracks the off-route flag for one leg at a time.
///
/// # Examples
/// ```
/// use courier_core::{GeoPoint, OffRouteMonitor, OffRouteTransition};
/// use courier_core::test_support::straight_leg;
///
/// let leg = straight_leg(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.01), 1);
/// let mut monitor = OffRouteMonitor::default();
///
/// let far = GeoPoint::new(0.002, 0.005); // about 220 m north of the leg
/// assert!(matches!(monitor.update(far, &leg), OffRouteTransition::LeftRoute { .. }));
/// assert!(monitor.is_off_route());
/// assert_eq!(monitor.update(far, &leg), OffRouteTransition::Unchanged);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OffRouteMonitor {
    config: OffRouteConfig,
    off_route: bool,
    pending: u32,
}

impl OffRouteMonitor {
    /// Create a monitor with `config`.
    #[must_use]
    pub const fn new(config: OffRouteConfig) -> Self {
        Self {
            config,
            off_route: false,
            pending: 0,
        }
    }

    /// Current off-route flag.
    #[must_use]
    pub const fn is_off_route(&self) -> bool {
        self.off_route
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &OffRouteConfig {
        &self.config
    }

    /// Shortest distance from `position` to any step path of `leg`.
    ///
    /// Returns `None` when the leg carries no geometry.
    #[must_use]
    pub fn distance_from_leg(position: GeoPoint, leg: &Leg) -> Option<f64> {
        leg.steps
            .iter()
            .filter_map(|step| distance_to_path(position, &step.path))
            .min_by(f64::total_cmp)
    }

    /// Classify `position` against `leg` and report any flag change.
    ///
    /// A leg without geometry leaves the flag unchanged.
    pub fn update(&mut self, position: GeoPoint, leg: &Leg) -> OffRouteTransition {
        let Some(distance_m) = Self::distance_from_leg(position, leg) else {
            return OffRouteTransition::Unchanged;
        };
        let outside = distance_m > self.config.threshold_m;
        if outside == self.off_route {
            self.pending = 0;
            return OffRouteTransition::Unchanged;
        }

        self.pending = self.pending.saturating_add(1);
        if self.pending < self.config.dwell_fixes.max(1) {
            return OffRouteTransition::Unchanged;
        }
        self.pending = 0;
        self.off_route = outside;
        if outside {
            log::info!("off route: {distance_m:.0} m from the active leg");
            OffRouteTransition::LeftRoute { distance_m }
        } else {
            log::info!("back on route");
            OffRouteTransition::Rejoined
        }
    }

    /// Clear the flag and any pending dwell count.
    pub const fn reset(&mut self) {
        self.off_route = false;
        self.pending = 0;
    }
}
