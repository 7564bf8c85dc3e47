//! Start, run and stop a navigation session against in-process doubles.

use std::sync::Arc;
use std::time::Duration;

use courier_core::test_support::{RecordingAnnouncer, StraightLineRouteProvider, straight_route};
use courier_core::{
    Announcer, GeoPoint, PositionFix, RoutingError, RoutingProvider, SequenceState, Stop,
};
use courier_routing::test_support::StubRouteProvider;
use courier_session::{
    ManualPositionSource, NavigationSession, NavigationSnapshot, NavigationView, PositionError,
    PositionSource, SessionConfig, SessionError,
};
use rstest::{fixture, rstest};

const ORIGIN: GeoPoint = GeoPoint::new(0.0, 0.0);

struct Harness {
    positions: Arc<ManualPositionSource>,
    announcer: Arc<RecordingAnnouncer>,
}

impl Harness {
    fn session(&self, routing: Arc<dyn RoutingProvider>) -> NavigationSession {
        let positions: Arc<dyn PositionSource> = self.positions.clone();
        let announcer: Arc<dyn Announcer> = self.announcer.clone();
        NavigationSession::new(routing, positions, announcer, SessionConfig::default())
    }

    fn straight_session(&self) -> NavigationSession {
        self.session(Arc::new(StraightLineRouteProvider::default()))
    }

    fn stage_origin(&self) {
        assert_eq!(self.positions.push(PositionFix::from(ORIGIN)), 0);
    }
}

#[fixture]
fn harness() -> Harness {
    Harness {
        positions: Arc::new(ManualPositionSource::default()),
        announcer: Arc::new(RecordingAnnouncer::default()),
    }
}

#[fixture]
fn stops() -> Vec<Stop> {
    vec![
        Stop::new("S0", GeoPoint::new(0.0, 0.01), "1 Wharf Street"),
        Stop::new("S1", GeoPoint::new(0.0, 0.02), "2 Wharf Street"),
        Stop::new("S2", GeoPoint::new(0.0, 0.03), "3 Wharf Street"),
    ]
}

fn unavailable() -> RoutingError {
    RoutingError::ProviderUnavailable {
        message: "maintenance".to_owned(),
    }
}

async fn wait_until(
    session: &NavigationSession,
    done: impl FnMut(&NavigationSnapshot) -> bool,
) -> NavigationSnapshot {
    let mut updates = session.subscribe();
    let snapshot = tokio::time::timeout(Duration::from_secs(60), updates.wait_for(done))
        .await
        .expect("snapshot condition reached in time")
        .expect("session still publishing");
    snapshot.clone()
}

fn count(items: &[String], wanted: &str) -> usize {
    items.iter().filter(|item| item.as_str() == wanted).count()
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn walking_every_stop_completes_the_run(harness: Harness, stops: Vec<Stop>) {
    let session = harness.straight_session();
    harness.stage_origin();
    session.start_ordered(stops.clone()).await.expect("start");
    assert_eq!(session.sequence_state().await, Some(SequenceState::EnRoute(0)));

    let route = straight_route(ORIGIN, &stops, 2);
    let path = route
        .legs()
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .flat_map(|step| step.path.iter().copied());
    for point in path {
        if harness.positions.send(PositionFix::from(point)).await == 0 {
            break;
        }
    }

    let last = wait_until(&session, |s| !s.is_navigating).await;
    assert!(last.error.is_none());
    assert_eq!(harness.positions.active_watches(), 0);

    let titles = harness.announcer.titles();
    assert_eq!(count(&titles, "Arrived at Stop"), 3);
    assert_eq!(count(&titles, "Continuing to Next Stop"), 2);
    assert_eq!(count(&titles, "Navigation Complete"), 1);
    let spoken = harness.announcer.spoken();
    assert_eq!(count(&spoken, "You are off route"), 0);
    assert_eq!(spoken.first().map(String::as_str), Some("Starting navigation"));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn failing_announcer_does_not_interrupt_navigation(stops: Vec<Stop>) {
    let harness = Harness {
        positions: Arc::new(ManualPositionSource::default()),
        announcer: Arc::new(RecordingAnnouncer::failing()),
    };
    let two_stops: Vec<Stop> = stops.into_iter().take(2).collect();
    let route = straight_route(ORIGIN, &two_stops, 2);
    let session = harness.session(Arc::new(StubRouteProvider::with_route(route.clone())));
    harness.stage_origin();
    session.start_ordered(two_stops).await.expect("start");

    let path = route
        .legs()
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .flat_map(|step| step.path.iter().copied());
    for point in path {
        if harness.positions.send(PositionFix::from(point)).await == 0 {
            break;
        }
    }

    let last = wait_until(&session, |s| !s.is_navigating).await;
    assert!(last.error.is_none(), "got {:?}", last.error);
    assert_eq!(
        harness.announcer.titles(),
        vec![
            "Starting Navigation".to_owned(),
            "Arrived at Stop".to_owned(),
            "Continuing to Next Stop".to_owned(),
            "Arrived at Stop".to_owned(),
            "Navigation Complete".to_owned(),
        ]
    );
    assert_eq!(harness.positions.active_watches(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn transient_routing_failures_are_retried(harness: Harness, stops: Vec<Stop>) {
    let provider = Arc::new(StubRouteProvider::scripted(vec![
        Err(unavailable()),
        Err(unavailable()),
        Ok(straight_route(ORIGIN, &stops, 2)),
    ]));
    let session = harness.session(provider.clone());
    harness.stage_origin();

    let summary = session.start_ordered(stops).await.expect("third attempt succeeds");
    assert_eq!(provider.calls(), 3);
    assert_eq!(summary.total_distance, "3.3 km");
    assert!(session.snapshot().is_navigating);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn exhausted_retries_report_the_failure(harness: Harness, stops: Vec<Stop>) {
    let provider = Arc::new(StubRouteProvider::with_error(unavailable()));
    let session = harness.session(provider.clone());
    harness.stage_origin();

    let err = session.start_ordered(stops).await.unwrap_err();
    assert!(matches!(err, SessionError::RouteUnavailable { attempts: 3, .. }));
    assert_eq!(provider.calls(), 3);

    let snapshot = session.snapshot();
    assert!(!snapshot.is_navigating);
    assert_eq!(
        snapshot.error.as_deref(),
        Some("Failed to calculate route after multiple attempts")
    );
    assert_eq!(harness.positions.active_watches(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn denied_location_access_blocks_start(stops: Vec<Stop>) {
    let positions = Arc::new(ManualPositionSource::refusing(PositionError::PermissionDenied));
    let session = NavigationSession::new(
        Arc::new(StraightLineRouteProvider::default()),
        positions,
        Arc::new(RecordingAnnouncer::default()),
        SessionConfig::default(),
    );

    let err = session.start(stops).await.unwrap_err();
    assert_eq!(err, SessionError::Position(PositionError::PermissionDenied));
    assert_eq!(
        session.snapshot().error.as_deref(),
        Some(
            "Location error: Location permission denied. Please enable location access in your \
             device settings."
        )
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn missing_first_fix_times_out(harness: Harness, stops: Vec<Stop>) {
    let session = harness.straight_session();
    let err = session.start(stops).await.unwrap_err();
    assert_eq!(err, SessionError::Position(PositionError::Timeout));
    assert_eq!(harness.positions.active_watches(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn stop_cancels_a_start_in_progress(harness: Harness, stops: Vec<Stop>) {
    let provider = Arc::new(StubRouteProvider::with_error(unavailable()));
    let session = Arc::new(harness.session(provider.clone()));
    harness.stage_origin();

    let starting = tokio::spawn({
        let starter = Arc::clone(&session);
        async move { starter.start_ordered(stops).await }
    });
    tokio::time::sleep(Duration::from_millis(500)).await;
    session.stop().await;

    let result = starting.await.expect("start task");
    assert_eq!(result.unwrap_err(), SessionError::Cancelled);
    assert_eq!(provider.calls(), 1);
    assert!(session.snapshot().error.is_none());
    assert_eq!(harness.positions.active_watches(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn second_start_is_refused(harness: Harness, stops: Vec<Stop>) {
    let session = harness.straight_session();
    harness.stage_origin();
    session.start_ordered(stops.clone()).await.expect("start");
    assert_eq!(
        session.start_ordered(stops).await.unwrap_err(),
        SessionError::AlreadyRunning
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn empty_stop_list_is_rejected(harness: Harness) {
    let session = harness.straight_session();
    assert_eq!(session.start(Vec::new()).await.unwrap_err(), SessionError::EmptyStops);
    assert_eq!(harness.positions.active_watches(), 0);
    assert!(session.snapshot().error.is_some());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn start_visits_nearest_stop_first(harness: Harness) {
    let session = harness.straight_session();
    harness.stage_origin();
    let far_first = vec![
        Stop::new("far", GeoPoint::new(0.0, 0.02), "2 Wharf Street"),
        Stop::new("near", GeoPoint::new(0.0, 0.01), "1 Wharf Street"),
    ];
    session.start(far_first).await.expect("start");
    let snapshot = session.snapshot();
    assert_eq!(snapshot.current_stop.map(|stop| stop.id), Some("near".to_owned()));
    assert_eq!(snapshot.stop_count, 2);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn lost_position_stream_ends_navigation(harness: Harness, stops: Vec<Stop>) {
    let session = harness.straight_session();
    harness.stage_origin();
    session.start_ordered(stops).await.expect("start");

    harness.positions.fail(&PositionError::Unavailable);
    let last = wait_until(&session, |s| !s.is_navigating).await;
    assert_eq!(
        last.error.as_deref(),
        Some("Location error: Location information unavailable. Please check your GPS settings.")
    );
    assert_eq!(harness.positions.active_watches(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn closed_position_stream_ends_navigation(harness: Harness, stops: Vec<Stop>) {
    let session = harness.straight_session();
    harness.stage_origin();
    session.start_ordered(stops).await.expect("start");

    harness.positions.close_all();
    let last = wait_until(&session, |s| !s.is_navigating).await;
    assert_eq!(
        last.error.as_deref(),
        Some("Location error: the position stream closed")
    );
    assert!(session.sequence_state().await.is_none());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn muted_voice_still_notifies(harness: Harness, stops: Vec<Stop>) {
    let session = harness.straight_session();
    session.set_voice_enabled(false).await;
    harness.stage_origin();
    session.start_ordered(stops).await.expect("start");

    assert!(harness.announcer.spoken().is_empty());
    assert_eq!(harness.announcer.titles(), vec!["Starting Navigation".to_owned()]);
    assert!(!session.snapshot().voice_enabled);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn stop_resets_view_and_progress(harness: Harness, stops: Vec<Stop>) {
    let session = harness.straight_session();
    harness.stage_origin();
    session.start_ordered(stops).await.expect("start");

    assert_eq!(session.toggle_navigation_view().await, NavigationView::Navigation);
    let camera = session.snapshot().camera.expect("camera once a fix is known");
    assert_eq!((camera.zoom, camera.tilt), (18, 45));

    session.stop().await;
    let snapshot = session.snapshot();
    assert!(!snapshot.is_navigating);
    assert_eq!(snapshot.navigation_view, NavigationView::Overview);
    assert!(session.sequence_state().await.is_none());
    assert_eq!(harness.positions.active_watches(), 0);
}
