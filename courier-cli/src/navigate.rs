//! Navigate command implementation for the Courier CLI.
//!
//! Replays a recorded fix trace through a live navigation session and
//! writes every published snapshot as one JSON line.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use courier_core::{AnnounceError, Announcer, RoutingProvider};
use courier_routing::{OsrmRouteProvider, OsrmRouteProviderConfig};
use courier_session::{
    NavigationSession, NavigationSnapshot, PositionSource, ReplayPositionSource, SessionConfig,
};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::input::{load_fixes, load_stops, require_file};
use crate::{
    ARG_FIXES, ARG_INTERVAL_MS, ARG_KEEP_ORDER, ARG_OSRM_BASE_URL, ARG_STOPS, CliError,
    ENV_NAVIGATE_FIXES, ENV_NAVIGATE_STOPS, write_json,
};

/// Replay interval used when none is configured.
pub(crate) const DEFAULT_INTERVAL_MS: u64 = 1_000;

/// Quiet period, in replay intervals, after which the trace counts as idle.
const IDLE_INTERVALS: u32 = 5;

/// Lower bound on the idle timeout.
const MIN_IDLE: Duration = Duration::from_secs(2);

/// CLI arguments for the `navigate` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Replay a recorded position trace through a navigation \
                 session. The route is requested from an OSRM instance and \
                 each snapshot of the navigation state is written to stdout \
                 as a JSON line until the last stop is reached or the trace \
                 goes quiet.",
    about = "Replay a fix trace through a navigation session"
)]
#[ortho_config(prefix = "COURIER")]
pub(crate) struct NavigateArgs {
    /// Path to a JSON file containing the stops.
    #[arg(long = ARG_STOPS, value_name = "path")]
    #[serde(default)]
    pub(crate) stops: Option<Utf8PathBuf>,
    /// Path to a JSON file containing the position fixes to replay.
    #[arg(long = ARG_FIXES, value_name = "path")]
    #[serde(default)]
    pub(crate) fixes: Option<Utf8PathBuf>,
    /// Base URL for the OSRM server (e.g. "http://localhost:5000").
    #[arg(long = ARG_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// Visit stops in file order instead of nearest-neighbour order.
    #[arg(long = ARG_KEEP_ORDER, value_name = "bool")]
    #[serde(default)]
    pub(crate) keep_order: Option<bool>,
    /// Milliseconds between replayed fixes.
    #[arg(long = ARG_INTERVAL_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) interval_ms: Option<u64>,
}

impl NavigateArgs {
    pub(crate) fn into_config(self) -> Result<NavigateConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        NavigateConfig::try_from(merged)
    }
}

/// Resolved `navigate` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NavigateConfig {
    pub(crate) stops: Utf8PathBuf,
    pub(crate) fixes: Utf8PathBuf,
    pub(crate) osrm_base_url: String,
    pub(crate) keep_order: bool,
    pub(crate) interval: Duration,
}

impl NavigateConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_file(&self.stops, ARG_STOPS)?;
        require_file(&self.fixes, ARG_FIXES)?;
        Ok(())
    }

    /// How long to wait for a new snapshot before treating the trace as idle.
    pub(crate) fn idle_timeout(&self) -> Duration {
        self.interval.saturating_mul(IDLE_INTERVALS).max(MIN_IDLE)
    }
}

impl TryFrom<NavigateArgs> for NavigateConfig {
    type Error = CliError;

    fn try_from(args: NavigateArgs) -> Result<Self, Self::Error> {
        let stops = args.stops.ok_or(CliError::MissingArgument {
            field: ARG_STOPS,
            env: ENV_NAVIGATE_STOPS,
        })?;
        let fixes = args.fixes.ok_or(CliError::MissingArgument {
            field: ARG_FIXES,
            env: ENV_NAVIGATE_FIXES,
        })?;
        let interval_ms = args.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS);
        if interval_ms == 0 {
            return Err(CliError::ZeroInterval);
        }
        let osrm_base_url = args
            .osrm_base_url
            .unwrap_or_else(|| OsrmRouteProviderConfig::default().base_url);
        Ok(Self {
            stops,
            fixes,
            osrm_base_url,
            keep_order: args.keep_order.unwrap_or(false),
            interval: Duration::from_millis(interval_ms),
        })
    }
}

/// Builds the routing provider for the current navigate invocation.
pub(super) trait RouteProviderBuilder {
    fn build(&self, config: &NavigateConfig) -> Result<Arc<dyn RoutingProvider>, CliError>;
}

pub(super) struct OsrmProviderBuilder;

impl RouteProviderBuilder for OsrmProviderBuilder {
    fn build(&self, config: &NavigateConfig) -> Result<Arc<dyn RoutingProvider>, CliError> {
        let provider = OsrmRouteProvider::new(config.osrm_base_url.clone()).map_err(|source| {
            CliError::BuildRouteProvider {
                base_url: config.osrm_base_url.clone(),
                source,
            }
        })?;
        Ok(Arc::new(provider))
    }
}

/// Announcer that writes speech and notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&self, text: &str) -> Result<(), AnnounceError> {
        log::info!("speak: {text}");
        Ok(())
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), AnnounceError> {
        log::info!("notify: {title}: {}", body.replace('\n', " / "));
        Ok(())
    }
}

/// How a replay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NavigateOutcome {
    /// The last stop was reached.
    Completed,
    /// The trace went quiet before the last stop.
    Idle,
    /// The session ended with an error, e.g. a lost position stream.
    Failed,
}

pub(super) fn run_navigate(args: NavigateArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let mut stdout = std::io::stdout().lock();
    let outcome = runtime.block_on(run_navigate_with(&config, &OsrmProviderBuilder, &mut stdout))?;
    log::info!("replay finished: {outcome:?}");
    Ok(())
}

pub(super) async fn run_navigate_with(
    config: &NavigateConfig,
    builder: &dyn RouteProviderBuilder,
    writer: &mut dyn Write,
) -> Result<NavigateOutcome, CliError> {
    config.validate_sources()?;
    let stops = load_stops(&config.stops, ARG_STOPS)?;
    let fixes = load_fixes(&config.fixes, ARG_FIXES)?;
    let routing = builder.build(config)?;
    log::info!(
        "replaying {} fixes every {:?} across {} stops",
        fixes.len(),
        config.interval,
        stops.len()
    );

    let positions: Arc<dyn PositionSource> =
        Arc::new(ReplayPositionSource::new(fixes, config.interval));
    let session = NavigationSession::new(
        routing,
        positions,
        Arc::new(LogAnnouncer),
        SessionConfig::default(),
    );
    let mut updates = session.subscribe();

    let started = if config.keep_order {
        session.start_ordered(stops).await
    } else {
        session.start(stops).await
    };
    let summary = started?;
    log::info!(
        "route: {} over {}",
        summary.total_distance,
        summary.total_duration
    );

    let idle = config.idle_timeout();
    loop {
        let snapshot = updates.borrow_and_update().clone();
        write_snapshot(writer, &snapshot)?;
        if !snapshot.is_navigating {
            return Ok(if snapshot.error.is_some() {
                NavigateOutcome::Failed
            } else {
                NavigateOutcome::Completed
            });
        }
        match tokio::time::timeout(idle, updates.changed()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => return Ok(NavigateOutcome::Failed),
            Err(_) => {
                log::warn!("no navigation updates for {idle:?}; stopping");
                session.stop().await;
                write_snapshot(writer, &session.snapshot())?;
                return Ok(NavigateOutcome::Idle);
            }
        }
    }
}

fn write_snapshot(writer: &mut dyn Write, snapshot: &NavigationSnapshot) -> Result<(), CliError> {
    let line = serde_json::to_string(snapshot).map_err(CliError::SerializeOutput)?;
    write_json(writer, &line)
}
