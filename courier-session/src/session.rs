//! The navigation session orchestrator.
//!
//! All mutable state lives behind one async mutex. The start path and the
//! fix worker both take it before touching the navigator, and `stop`
//! cancels the run while holding it, so a fix handler either runs to
//! completion before a stop or sees the cancellation and exits without
//! touching anything.

use std::sync::Arc;

use courier_core::format::format_duration_minutes;
use courier_core::{
    Announcer, GeoPoint, NearestNeighbourSequencer, PositionFix, RouteRequest, RouteSummary,
    RoutingProvider, SequenceState, Stop, StopSequencer,
};
use tokio::sync::{Mutex, mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::messages::{self, speak};
use crate::position::{FixSink, PositionSource, PositionUpdate, WatchId};
use crate::{
    DisplayPrefs, NavigationEvent, NavigationSnapshot, NavigationView, Navigator, PositionError,
    SessionConfig, SessionError, compute_route_with_retry,
};

enum Phase {
    Idle,
    Starting { cancel: CancellationToken },
    Navigating(Box<Active>),
}

struct Active {
    navigator: Navigator,
    watch: WatchId,
    cancel: CancellationToken,
}

struct SessionState {
    generation: u64,
    phase: Phase,
    prefs: DisplayPrefs,
    error: Option<String>,
}

struct Inner {
    routing: Arc<dyn RoutingProvider>,
    positions: Arc<dyn PositionSource>,
    announcer: Arc<dyn Announcer>,
    config: SessionConfig,
    state: Mutex<SessionState>,
    snapshots: watch::Sender<NavigationSnapshot>,
    shutdown: CancellationToken,
}

/// One delivery run from the first fix to the final stop.
///
/// Collaborators are injected: the routing provider computes the route, the
/// position source feeds fixes, and the announcer speaks and notifies. The
/// session publishes a [`NavigationSnapshot`] after every change; use
/// [`subscribe`](Self::subscribe) to follow them.
///
/// Dropping the session cancels any run in progress.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use courier_core::test_support::{RecordingAnnouncer, StraightLineRouteProvider};
/// use courier_core::{GeoPoint, PositionFix, Stop};
/// use courier_session::{ManualPositionSource, NavigationSession, SessionConfig};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build()?.block_on(async {
/// let positions = Arc::new(ManualPositionSource::default());
/// let session = NavigationSession::new(
///     Arc::new(StraightLineRouteProvider::default()),
///     positions.clone(),
///     Arc::new(RecordingAnnouncer::default()),
///     SessionConfig::default(),
/// );
///
/// assert_eq!(positions.push(PositionFix::new(0.0, 0.0)), 0);
/// let stops = vec![Stop::new("s0", GeoPoint::new(0.0, 0.01), "1 Mill Lane")];
/// let summary = session.start(stops).await?;
/// assert_eq!(summary.total_distance, "1.1 km");
/// assert!(session.snapshot().is_navigating);
///
/// session.stop().await;
/// assert!(!session.snapshot().is_navigating);
/// # Ok::<(), courier_session::SessionError>(())
/// # })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct NavigationSession {
    inner: Arc<Inner>,
    sequencer: Arc<dyn StopSequencer>,
}

impl std::fmt::Debug for NavigationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationSession")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl NavigationSession {
    /// Create an idle session that orders stops nearest-neighbour first.
    #[must_use]
    pub fn new(
        routing: Arc<dyn RoutingProvider>,
        positions: Arc<dyn PositionSource>,
        announcer: Arc<dyn Announcer>,
        config: SessionConfig,
    ) -> Self {
        let prefs = DisplayPrefs::default();
        let (snapshots, _) = watch::channel(NavigationSnapshot::idle(prefs, None));
        Self {
            inner: Arc::new(Inner {
                routing,
                positions,
                announcer,
                config,
                state: Mutex::new(SessionState {
                    generation: 0,
                    phase: Phase::Idle,
                    prefs,
                    error: None,
                }),
                snapshots,
                shutdown: CancellationToken::new(),
            }),
            sequencer: Arc::new(NearestNeighbourSequencer),
        }
    }

    /// Replace the stop sequencer used by [`start`](Self::start).
    #[must_use]
    pub fn with_sequencer(mut self, sequencer: Arc<dyn StopSequencer>) -> Self {
        self.sequencer = sequencer;
        self
    }

    /// Order `stops` from the first fix, compute a route and start navigating.
    ///
    /// Returns once navigation is under way; fixes are then handled on a
    /// background task until the last stop is reached or [`stop`](Self::stop)
    /// is called.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the session is already running, there
    /// are no stops, the position stream fails or times out before the first
    /// fix, or no route can be computed. The error text is also published
    /// in the snapshot.
    pub async fn start(&self, stops: Vec<Stop>) -> Result<RouteSummary, SessionError> {
        self.begin(stops, true).await
    }

    /// Like [`start`](Self::start), but visit `stops` in the order given.
    ///
    /// # Errors
    ///
    /// As for [`start`](Self::start).
    pub async fn start_ordered(&self, stops: Vec<Stop>) -> Result<RouteSummary, SessionError> {
        self.begin(stops, false).await
    }

    /// Stop navigating and reset to the initial state.
    ///
    /// Cancels an in-flight start, clears the position watch and forgets any
    /// reported error.
    pub async fn stop(&self) {
        let mut state = self.inner.state.lock().await;
        if !matches!(state.phase, Phase::Idle) {
            log::info!("navigation stopped");
        }
        state.generation = state.generation.wrapping_add(1);
        self.inner.teardown(&mut state);
        state.error = None;
        self.inner.publish(&state);
    }

    /// Follow snapshot updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NavigationSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// The latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> NavigationSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    /// Progress through the stops, while navigating.
    pub async fn sequence_state(&self) -> Option<SequenceState> {
        match &self.inner.state.lock().await.phase {
            Phase::Navigating(active) => Some(active.navigator.sequence_state()),
            Phase::Idle | Phase::Starting { .. } => None,
        }
    }

    /// Switch between overview and follow-the-vehicle framing.
    pub async fn toggle_navigation_view(&self) -> NavigationView {
        let mut state = self.inner.state.lock().await;
        state.prefs.view = state.prefs.view.toggled();
        self.inner.publish(&state);
        state.prefs.view
    }

    /// Turn spoken guidance on or off. Notifications are unaffected.
    pub async fn set_voice_enabled(&self, enabled: bool) {
        let mut state = self.inner.state.lock().await;
        state.prefs.voice_enabled = enabled;
        self.inner.publish(&state);
    }

    /// Flip spoken guidance and return the new setting.
    pub async fn toggle_voice_guidance(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        state.prefs.voice_enabled = !state.prefs.voice_enabled;
        self.inner.publish(&state);
        state.prefs.voice_enabled
    }

    async fn begin(&self, stops: Vec<Stop>, reorder: bool) -> Result<RouteSummary, SessionError> {
        let (generation, cancel) = {
            let mut state = self.inner.state.lock().await;
            if !matches!(state.phase, Phase::Idle) {
                return Err(SessionError::AlreadyRunning);
            }
            state.generation = state.generation.wrapping_add(1);
            let cancel = self.inner.shutdown.child_token();
            state.phase = Phase::Starting {
                cancel: cancel.clone(),
            };
            state.error = None;
            self.inner.publish(&state);
            (state.generation, cancel)
        };

        if stops.is_empty() {
            return Err(self.abort_start(generation, None, SessionError::EmptyStops).await);
        }
        let (sink, mut updates) = FixSink::channel(self.inner.config.fix_buffer);
        let watch_id = match self.inner.positions.watch(&self.inner.config.watch, sink) {
            Ok(id) => id,
            Err(err) => return Err(self.abort_start(generation, None, err.into()).await),
        };

        match self.prepare(stops, reorder, &mut updates, &cancel).await {
            Ok((navigator, first_fix)) => {
                self.activate(generation, cancel, watch_id, navigator, first_fix, updates)
                    .await
            }
            Err(err) => Err(self.abort_start(generation, Some(watch_id), err).await),
        }
    }

    async fn prepare(
        &self,
        stops: Vec<Stop>,
        reorder: bool,
        updates: &mut mpsc::Receiver<PositionUpdate>,
        cancel: &CancellationToken,
    ) -> Result<(Navigator, PositionFix), SessionError> {
        let (first_fix, origin) = wait_for_first_fix(updates, &self.inner.config, cancel).await?;
        let ordered = if reorder {
            self.sequencer.sequence(origin, stops)
        } else {
            stops
        };
        let request =
            RouteRequest::through_stops(origin, &ordered).map_err(SessionError::Routing)?;
        log::info!("requesting a route through {} stops", ordered.len());
        let route = compute_route_with_retry(
            self.inner.routing.as_ref(),
            &request,
            &self.inner.config.retry,
            cancel,
        )
        .await?;
        let navigator = Navigator::new(Arc::new(route), ordered, self.inner.config.navigator)?;
        Ok((navigator, first_fix))
    }

    async fn activate(
        &self,
        generation: u64,
        cancel: CancellationToken,
        watch_id: WatchId,
        navigator: Navigator,
        first_fix: PositionFix,
        updates: mpsc::Receiver<PositionUpdate>,
    ) -> Result<RouteSummary, SessionError> {
        let mut state = self.inner.state.lock().await;
        if cancel.is_cancelled() || state.generation != generation {
            drop(state);
            let error = SessionError::Cancelled;
            return Err(self.abort_start(generation, Some(watch_id), error).await);
        }

        let summary = navigator.route().summary();
        let first_stop = navigator.stops().first().map(|stop| stop.address.clone());
        let first_leg = navigator
            .route()
            .leg(0)
            .map(|leg| format_duration_minutes(leg.duration));
        state.phase = Phase::Navigating(Box::new(Active {
            navigator,
            watch: watch_id,
            cancel: cancel.clone(),
        }));
        log::info!(
            "navigation started: {} over {}",
            summary.total_distance,
            summary.total_duration
        );
        messages::notify(
            self.inner.announcer.as_ref(),
            messages::STARTING_TITLE,
            &messages::starting_body(
                first_stop.as_deref().unwrap_or_default(),
                first_leg.as_deref().unwrap_or_default(),
            ),
        );
        speak(
            self.inner.announcer.as_ref(),
            state.prefs.voice_enabled,
            messages::STARTING_SPOKEN,
        );

        let finished = self.inner.apply(&mut state, Ok(first_fix));
        self.inner.publish(&state);
        drop(state);
        if !finished {
            tokio::spawn(run_worker(Arc::clone(&self.inner), updates, cancel, generation));
        }
        Ok(summary)
    }

    async fn abort_start(
        &self,
        generation: u64,
        watch_id: Option<WatchId>,
        error: SessionError,
    ) -> SessionError {
        if let Some(id) = watch_id {
            self.inner.positions.clear_watch(id);
        }
        let mut state = self.inner.state.lock().await;
        if state.generation == generation {
            state.phase = Phase::Idle;
            if !matches!(error, SessionError::Cancelled) {
                state.error = Some(error.to_string());
            }
            self.inner.publish(&state);
        }
        log::warn!("navigation did not start: {error}");
        error
    }
}

impl Drop for NavigationSession {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
    }
}

impl Inner {
    fn publish(&self, state: &SessionState) {
        let snapshot = match &state.phase {
            Phase::Navigating(active) => {
                NavigationSnapshot::navigating(&active.navigator, state.prefs)
            }
            Phase::Idle | Phase::Starting { .. } => {
                NavigationSnapshot::idle(state.prefs, state.error.clone())
            }
        };
        self.snapshots.send_replace(snapshot);
    }

    /// Cancel the run, clear the watch and return to idle.
    fn teardown(&self, state: &mut SessionState) {
        match std::mem::replace(&mut state.phase, Phase::Idle) {
            Phase::Navigating(active) => {
                active.cancel.cancel();
                self.positions.clear_watch(active.watch);
            }
            Phase::Starting { cancel } => cancel.cancel(),
            Phase::Idle => {}
        }
        state.prefs.view = NavigationView::Overview;
    }

    /// Handle one update. Returns `true` when the run has ended.
    fn apply(&self, state: &mut SessionState, update: PositionUpdate) -> bool {
        let voice = state.prefs.voice_enabled;
        let fix = match update {
            Ok(fix) => fix,
            Err(err) => {
                let error = SessionError::Position(err);
                log::warn!("navigation stopped: {error}");
                self.teardown(state);
                state.error = Some(error.to_string());
                return true;
            }
        };
        let Phase::Navigating(active) = &mut state.phase else {
            return true;
        };
        let events = match active.navigator.handle_fix(&fix) {
            Ok(events) => events,
            Err(err) => {
                log::debug!("dropping fix: {err}");
                return false;
            }
        };

        let mut completed = false;
        for event in &events {
            completed |= self.announce(event, voice);
        }
        if completed {
            self.teardown(state);
            messages::notify(
                self.announcer.as_ref(),
                messages::COMPLETE_TITLE,
                messages::COMPLETE_BODY,
            );
            speak(self.announcer.as_ref(), voice, messages::COMPLETE_BODY);
            log::info!("navigation complete");
        }
        completed
    }

    /// Deliver the announcements for `event`. Returns `true` on completion.
    fn announce(&self, event: &NavigationEvent, voice: bool) -> bool {
        let announcer = self.announcer.as_ref();
        match event {
            NavigationEvent::OffRoute { distance_m } => {
                log::info!("off route by {distance_m:.0} m");
                speak(announcer, voice, messages::OFF_ROUTE_SPOKEN);
                false
            }
            NavigationEvent::BackOnRoute => false,
            NavigationEvent::Arrived { stop, next } => {
                arrived(announcer, voice, stop);
                messages::notify(
                    announcer,
                    messages::CONTINUING_TITLE,
                    &messages::next_stop_body(&next.address),
                );
                speak(announcer, voice, messages::CONTINUING_SPOKEN);
                false
            }
            NavigationEvent::Completed { stop } => {
                arrived(announcer, voice, stop);
                true
            }
        }
    }
}

fn arrived(announcer: &dyn Announcer, voice: bool, stop: &Stop) {
    messages::notify(
        announcer,
        messages::ARRIVED_TITLE,
        &messages::arrived_body(&stop.address),
    );
    speak(announcer, voice, messages::ARRIVED_SPOKEN);
}

/// Wait for the first well-formed fix, bounded by the watch timeout.
async fn wait_for_first_fix(
    updates: &mut mpsc::Receiver<PositionUpdate>,
    config: &SessionConfig,
    cancel: &CancellationToken,
) -> Result<(PositionFix, GeoPoint), SessionError> {
    let deadline = tokio::time::Instant::now() + config.watch.timeout;
    loop {
        let received = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(SessionError::Cancelled),
            received = tokio::time::timeout_at(deadline, updates.recv()) => received,
        };
        match received {
            Err(_) => return Err(PositionError::Timeout.into()),
            Ok(None) => return Err(PositionError::Closed.into()),
            Ok(Some(Err(err))) => return Err(err.into()),
            Ok(Some(Ok(fix))) => match fix.position() {
                Ok(position) => return Ok((fix, position)),
                Err(err) => log::debug!("ignoring malformed first fix: {err}"),
            },
        }
    }
}

/// Serialized fix handling for one run.
async fn run_worker(
    inner: Arc<Inner>,
    mut updates: mpsc::Receiver<PositionUpdate>,
    cancel: CancellationToken,
    generation: u64,
) {
    loop {
        let received = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = updates.recv() => received,
        };
        let mut state = inner.state.lock().await;
        if cancel.is_cancelled() || state.generation != generation {
            break;
        }
        let update = received.unwrap_or_else(|| {
            log::info!("position stream ended");
            Err(PositionError::Closed)
        });
        let finished = inner.apply(&mut state, update);
        inner.publish(&state);
        if finished {
            return;
        }
    }

    // Cancelled without a stop, e.g. the session was dropped.
    let mut state = inner.state.lock().await;
    if state.generation == generation && matches!(state.phase, Phase::Navigating(_)) {
        inner.teardown(&mut state);
        inner.publish(&state);
    }
}
