//! HTTP-based `RoutingProvider` using OSRM's Route API.
//!
//! [`OsrmRouteProvider`] turns a [`RouteRequest`] into a single
//! `/route/v1/{profile}/...` call with `steps=true` and GeoJSON geometries,
//! and converts the first returned route into a [`Route`] with one leg per
//! stop.
//!
//! # Example
//!
//! ```no_run
//! use courier_core::{GeoPoint, RouteRequest, RoutingProvider, Stop};
//! use courier_routing::OsrmRouteProvider;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OsrmRouteProvider::new("http://localhost:5000")?;
//! let stops = vec![Stop::new("WB-1", GeoPoint::new(51.51, -0.12), "1 Strand")];
//! let request = RouteRequest::through_stops(GeoPoint::new(51.5, -0.1), &stops)?;
//! let route = provider.compute_route(&request).await?;
//! println!("{}", route.summary().total_distance);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use courier_core::{
    GeoPoint, Leg, Route, RouteError, RouteRequest, RoutingError, RoutingProvider, Step,
};
use reqwest::Client;
use url::Url;

use crate::instructions::{instruction, maneuver_tag};
use crate::osrm::{OsrmLeg, OsrmStep, RouteResponse};

/// Error type for [`OsrmRouteProvider`] construction failures.
#[derive(Debug)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    HttpClient(reqwest::Error),
    /// The base URL could not be parsed or cannot carry a path.
    InvalidBaseUrl(String),
}

impl std::fmt::Display for ProviderBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpClient(err) => write!(f, "failed to build HTTP client: {err}"),
            Self::InvalidBaseUrl(url) => write!(f, "invalid OSRM base URL: {url}"),
        }
    }
}

impl std::error::Error for ProviderBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HttpClient(err) => Some(err),
            Self::InvalidBaseUrl(_) => None,
        }
    }
}

/// Default user agent for OSRM requests.
pub const DEFAULT_USER_AGENT: &str = "courier-routing/0.1";

/// Default OSRM routing profile.
pub const DEFAULT_PROFILE: &str = "driving";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`OsrmRouteProvider`].
#[derive(Debug, Clone)]
pub struct OsrmRouteProviderConfig {
    /// Base URL for the OSRM service (e.g., `"http://localhost:5000"`).
    pub base_url: String,
    /// OSRM profile segment of the request path.
    pub profile: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for OsrmRouteProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_owned(),
            profile: DEFAULT_PROFILE.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl OsrmRouteProviderConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the routing profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Routing provider backed by an OSRM Route service.
///
/// The provider never reorders waypoints: requests with
/// `optimize_waypoints = true` are rejected as invalid.
#[derive(Debug)]
pub struct OsrmRouteProvider {
    client: Client,
    base_url: Url,
    config: OsrmRouteProviderConfig,
}

impl OsrmRouteProvider {
    /// Create a new provider with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(OsrmRouteProviderConfig::new(base_url))
    }

    /// Create a new provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn with_config(config: OsrmRouteProviderConfig) -> Result<Self, ProviderBuildError> {
        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ProviderBuildError::InvalidBaseUrl(config.base_url.clone()))?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &OsrmRouteProviderConfig {
        &self.config
    }

    /// Build the OSRM Route API URL for `request`.
    ///
    /// The path is `{base}/route/v1/{profile}/{coordinates}` where
    /// coordinates are semicolon-separated `lng,lat` pairs in travel order.
    fn build_route_url(&self, request: &RouteRequest) -> Url {
        let coords = request
            .points()
            .map(|p| format!("{},{}", p.lng, p.lat))
            .collect::<Vec<_>>()
            .join(";");

        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["route", "v1", self.config.profile.as_str(), coords.as_str()]);
        }
        url.query_pairs_mut()
            .append_pair("steps", "true")
            .append_pair("geometries", "geojson")
            .append_pair("overview", "false");
        url
    }

    /// Fetch and decode the Route response.
    ///
    /// OSRM reports routing failures such as `NoRoute` with a 4xx status and
    /// a JSON body, so the body is decoded before the status is considered.
    async fn fetch_route(&self, url: Url) -> Result<RouteResponse, RoutingError> {
        log::debug!("requesting route from {url}");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        let status = response.status();
        response
            .json::<RouteResponse>()
            .await
            .map_err(|err| RoutingError::ProviderUnavailable {
                message: if status.is_success() {
                    format!("malformed OSRM response from {url}: {err}")
                } else {
                    format!("HTTP {} from {url}", status.as_u16())
                },
            })
    }

    /// Convert a reqwest error to a `RoutingError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &Url) -> RoutingError {
        let message = if error.is_timeout() {
            format!(
                "request to {url} timed out after {} s",
                self.config.timeout.as_secs()
            )
        } else {
            format!("request to {url} failed: {error}")
        };
        RoutingError::ProviderUnavailable { message }
    }
}

/// Map a non-`Ok` OSRM status code to a `RoutingError`.
fn service_error(code: &str, message: Option<String>) -> RoutingError {
    let message = message.unwrap_or_else(|| code.to_owned());
    match code {
        "NoRoute" | "NoSegment" => RoutingError::NoRouteFound { message },
        c if c.starts_with("Invalid") => RoutingError::InvalidRequest { message },
        _ => RoutingError::ProviderUnavailable {
            message: format!("{code}: {message}"),
        },
    }
}

/// Convert an OSRM response into a route for `request`.
fn convert_response(response: RouteResponse, request: &RouteRequest) -> Result<Route, RoutingError> {
    if !response.is_ok() {
        return Err(service_error(&response.code, response.message));
    }
    let RouteResponse {
        routes, waypoints, ..
    } = response;
    let osrm_route = routes
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::NoRouteFound {
            message: "OSRM returned no routes".to_owned(),
        })?;

    let expected = request.leg_count();
    if osrm_route.legs.len() != expected {
        return Err(RouteError::StopCountMismatch {
            legs: osrm_route.legs.len(),
            stops: expected,
        }
        .into());
    }

    let points: Vec<GeoPoint> = request.points().collect();
    let names: Vec<String> = waypoints.into_iter().map(|w| w.name).collect();
    let legs = osrm_route
        .legs
        .into_iter()
        .zip(points.windows(2))
        .enumerate()
        .map(|(index, (leg, ends))| {
            let name = |i: usize| names.get(i).cloned().unwrap_or_default();
            convert_leg(
                leg,
                ends,
                name(index),
                name(index.saturating_add(1)),
            )
        })
        .collect();
    Ok(Route::new(legs)?)
}

fn convert_leg(leg: OsrmLeg, ends: &[GeoPoint], start_address: String, end_address: String) -> Leg {
    let (start, end) = match ends {
        [start, end, ..] => (*start, *end),
        _ => (GeoPoint::default(), GeoPoint::default()),
    };
    Leg {
        steps: leg.steps.into_iter().map(convert_step).collect(),
        start,
        end,
        start_address,
        end_address,
        distance_m: leg.distance,
        duration: seconds(leg.duration),
    }
}

fn convert_step(step: OsrmStep) -> Step {
    Step {
        instruction: instruction(&step.maneuver, &step.name),
        maneuver: maneuver_tag(&step.maneuver),
        distance_m: step.distance,
        duration: seconds(step.duration),
        path: step
            .geometry
            .coordinates
            .into_iter()
            .map(|[lng, lat]| GeoPoint::new(lat, lng))
            .collect(),
    }
}

/// Seconds to `Duration`, treating negative or non-finite values as zero.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

#[async_trait]
impl RoutingProvider for OsrmRouteProvider {
    async fn compute_route(&self, request: &RouteRequest) -> Result<Route, RoutingError> {
        if request.optimize_waypoints {
            return Err(RoutingError::InvalidRequest {
                message: "OSRM route service cannot reorder waypoints".to_owned(),
            });
        }
        let url = self.build_route_url(request);
        let response = self.fetch_route(url).await?;
        let route = convert_response(response, request)?;
        log::info!(
            "OSRM route: {} legs, {}",
            route.legs().len(),
            route.summary().total_distance
        );
        Ok(route)
    }
}
