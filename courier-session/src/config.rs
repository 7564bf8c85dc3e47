//! Tunables for the navigator, route retries and the position stream.

use std::time::Duration;

use courier_core::OffRouteConfig;
use courier_core::arrival::DEFAULT_ARRIVAL_RADIUS_M;
use courier_core::trimmer::DEFAULT_TRIM_RADIUS_M;

/// Moves shorter than this do not update the heading.
pub const DEFAULT_MIN_HEADING_MOVE_M: f64 = 0.5;

/// Speeds at or below this count as stationary for ETA purposes.
pub const DEFAULT_MOVING_SPEED_KMH: f64 = 1.0;

/// Per-fix pipeline configuration.
#[derive(Debug, Clone, Copy)]
pub struct NavigatorConfig {
    /// Distance within which a stop counts as reached.
    pub arrival_radius_m: f64,
    /// Off-route detection settings.
    pub off_route: OffRouteConfig,
    /// Distance from the route within which the remaining path is redrawn.
    pub trim_radius_m: f64,
    /// Minimum move between fixes before the heading is recomputed.
    pub min_heading_move_m: f64,
    /// Speed above which ETA is derived from the current speed.
    pub moving_speed_kmh: f64,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            arrival_radius_m: DEFAULT_ARRIVAL_RADIUS_M,
            off_route: OffRouteConfig::default(),
            trim_radius_m: DEFAULT_TRIM_RADIUS_M,
            min_heading_move_m: DEFAULT_MIN_HEADING_MOVE_M,
            moving_speed_kmh: DEFAULT_MOVING_SPEED_KMH,
        }
    }
}

impl NavigatorConfig {
    /// Override the arrival radius.
    #[must_use]
    pub const fn with_arrival_radius(mut self, radius_m: f64) -> Self {
        self.arrival_radius_m = radius_m;
        self
    }

    /// Override the off-route settings.
    #[must_use]
    pub const fn with_off_route(mut self, off_route: OffRouteConfig) -> Self {
        self.off_route = off_route;
        self
    }

    /// Override the trim radius.
    #[must_use]
    pub const fn with_trim_radius(mut self, radius_m: f64) -> Self {
        self.trim_radius_m = radius_m;
        self
    }
}

/// How route computation is retried when the provider fails transiently.
///
/// Before retry `n` (counting from one) the session waits `base_delay × n`.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use courier_session::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 3);
/// assert_eq!(policy.backoff(1), Duration::from_secs(1));
/// assert_eq!(policy.backoff(2), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay unit for the linear backoff.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Override the attempt count (at least one attempt is always made).
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Override the delay unit.
    #[must_use]
    pub const fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Wait before the `retry`th retry.
    #[must_use]
    pub const fn backoff(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry)
    }
}

/// Options passed through to the platform location service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Ask for the most accurate fixes available.
    pub high_accuracy: bool,
    /// How long to wait for a fix before reporting a timeout.
    pub timeout: Duration,
    /// Oldest cached fix the service may hand back.
    pub maximum_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(15),
            maximum_age: Duration::from_secs(1),
        }
    }
}

/// Everything a [`NavigationSession`](crate::NavigationSession) needs to run.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Per-fix pipeline settings.
    pub navigator: NavigatorConfig,
    /// Route computation retries.
    pub retry: RetryPolicy,
    /// Position stream options.
    pub watch: WatchOptions,
    /// Capacity of the fix queue between the position source and the worker.
    pub fix_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            navigator: NavigatorConfig::default(),
            retry: RetryPolicy::default(),
            watch: WatchOptions::default(),
            fix_buffer: 32,
        }
    }
}

impl SessionConfig {
    /// Override the navigator settings.
    #[must_use]
    pub const fn with_navigator(mut self, navigator: NavigatorConfig) -> Self {
        self.navigator = navigator;
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the position stream options.
    #[must_use]
    pub const fn with_watch(mut self, watch: WatchOptions) -> Self {
        self.watch = watch;
        self
    }

    /// Override the fix queue capacity (minimum one).
    #[must_use]
    pub const fn with_fix_buffer(mut self, fix_buffer: usize) -> Self {
        self.fix_buffer = if fix_buffer == 0 { 1 } else { fix_buffer };
        self
    }
}
