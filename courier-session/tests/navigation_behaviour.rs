//! Behavioural tests for the per-fix navigation pipeline.

use std::cell::RefCell;
use std::sync::Arc;

use courier_core::test_support::straight_route;
use courier_core::{GeoPoint, PositionFix, SequenceState, Stop};
use courier_session::{
    DisplayPrefs, NavigationEvent, NavigationSnapshot, Navigator, NavigatorConfig,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

const DEPOT: GeoPoint = GeoPoint::new(0.0, 0.0);

#[derive(Default)]
struct Run {
    navigator: Option<Navigator>,
    events: Vec<NavigationEvent>,
    states: Vec<SequenceState>,
    snapshots: Vec<NavigationSnapshot>,
}

impl Run {
    fn feed(&mut self, position: GeoPoint) {
        let Some(navigator) = self.navigator.as_mut() else {
            panic!("route not set up");
        };
        match navigator.handle_fix(&PositionFix::from(position)) {
            Ok(events) => self.events.extend(events),
            Err(err) => panic!("fix rejected: {err}"),
        }
        let state = navigator.sequence_state();
        if self.states.last() != Some(&state) {
            self.states.push(state);
        }
        self.snapshots
            .push(NavigationSnapshot::navigating(navigator, DisplayPrefs::default()));
    }
}

#[fixture]
fn run() -> RefCell<Run> {
    RefCell::new(Run::default())
}

fn stops() -> Vec<Stop> {
    vec![
        Stop::new("S0", GeoPoint::new(0.0, 0.01), "1 Canal Row"),
        Stop::new("S1", GeoPoint::new(0.0, 0.02), "2 Canal Row"),
        Stop::new("S2", GeoPoint::new(0.0, 0.03), "3 Canal Row"),
    ]
}

#[given("a three-stop route from the depot")]
fn three_stop_route(#[from(run)] run: &RefCell<Run>) {
    let route = Arc::new(straight_route(DEPOT, &stops(), 5));
    let navigator =
        Navigator::new(route, stops(), NavigatorConfig::default()).expect("route fits stops");
    let mut state = run.borrow_mut();
    state.states.push(navigator.sequence_state());
    state.navigator = Some(navigator);
}

#[when("the vehicle follows every point of the route")]
fn follow_route(#[from(run)] run: &RefCell<Run>) {
    let points: Vec<GeoPoint> = straight_route(DEPOT, &stops(), 5)
        .legs()
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .flat_map(|step| step.path.iter().copied())
        .collect();
    let mut state = run.borrow_mut();
    for point in points {
        if state
            .navigator
            .as_ref()
            .is_some_and(|n| n.sequence_state() == SequenceState::Completed)
        {
            break;
        }
        state.feed(point);
    }
}

#[when("a fix arrives 200 metres beside the first leg")]
fn stray(#[from(run)] run: &RefCell<Run>) {
    let mut state = run.borrow_mut();
    state.feed(DEPOT);
    state.feed(GeoPoint::new(0.0018, 0.005));
}

#[then("the stops are reached in order and the run completes")]
fn reached_in_order(#[from(run)] run: &RefCell<Run>) {
    let state = run.borrow();
    assert_eq!(
        state.states,
        vec![
            SequenceState::EnRoute(0),
            SequenceState::EnRoute(1),
            SequenceState::EnRoute(2),
            SequenceState::Completed,
        ]
    );
    let arrivals: Vec<&str> = state
        .events
        .iter()
        .filter_map(|event| match event {
            NavigationEvent::Arrived { stop, .. } | NavigationEvent::Completed { stop } => {
                Some(stop.id.as_str())
            }
            NavigationEvent::OffRoute { .. } | NavigationEvent::BackOnRoute => None,
        })
        .collect();
    assert_eq!(arrivals, vec!["S0", "S1", "S2"]);
}

#[then("the vehicle is never off route")]
fn never_off_route(#[from(run)] run: &RefCell<Run>) {
    let state = run.borrow();
    assert!(state.snapshots.iter().all(|s| !s.is_off_route));
    assert!(
        !state
            .events
            .iter()
            .any(|event| matches!(event, NavigationEvent::OffRoute { .. }))
    );
}

#[then("no more than three upcoming turns are ever shown")]
fn upcoming_bounded(#[from(run)] run: &RefCell<Run>) {
    let state = run.borrow();
    assert!(!state.snapshots.is_empty());
    assert!(state.snapshots.iter().all(|s| s.upcoming_turns.len() <= 3));
}

#[then("the vehicle is reported off route")]
fn reported_off_route(#[from(run)] run: &RefCell<Run>) {
    let state = run.borrow();
    assert!(
        state
            .events
            .iter()
            .any(|event| matches!(event, NavigationEvent::OffRoute { distance_m } if *distance_m > 100.0))
    );
    assert!(state.snapshots.last().is_some_and(|s| s.is_off_route));
}

#[then("guidance still targets the first stop")]
fn still_first_stop(#[from(run)] run: &RefCell<Run>) {
    let state = run.borrow();
    let current = state
        .snapshots
        .last()
        .and_then(|s| s.current_stop.as_ref())
        .map(|stop| stop.id.clone());
    assert_eq!(current.as_deref(), Some("S0"));
}

#[scenario(path = "tests/features/navigation.feature", index = 0)]
fn walk_whole_route(run: RefCell<Run>) {
    let _ = run;
}

#[scenario(path = "tests/features/navigation.feature", index = 1)]
fn stray_from_route(run: RefCell<Run>) {
    let _ = run;
}
