//! Integration tests for the SOS countdown running on the tokio clock
//!
//! Time is paused, so each test advances a virtual clock instead of waiting.

use code4care::config::AppConfig;
use code4care::emergency::EmergencyDesk;
use code4care::error::{EmergencyError, SosError};
use code4care::notification::MemoryNotifier;
use code4care::router::{HistoryNavigator, Route};
use code4care::sos::SosEvent;
use code4care::{SosSession, SosState};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time;

const SECOND: Duration = Duration::from_secs(1);
const SLACK: Duration = Duration::from_millis(10);

struct Harness {
    desk: EmergencyDesk,
    notices: Arc<MemoryNotifier>,
    navigator: Arc<HistoryNavigator>,
    events: UnboundedReceiver<SosEvent>,
}

fn harness() -> Harness {
    let notices = Arc::new(MemoryNotifier::new());
    let navigator = Arc::new(HistoryNavigator::new());
    let desk = EmergencyDesk::new(&AppConfig::default(), notices.clone(), navigator.clone());
    let events = desk.subscribe();
    Harness {
        desk,
        notices,
        navigator,
        events,
    }
}

fn drain(rx: &mut UnboundedReceiver<SosEvent>) -> Vec<SosEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn dispatch_count(events: &[SosEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SosEvent::Dispatched { .. }))
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_uncancelled_countdown_dispatches_once() {
    let mut h = harness();
    h.desk.activate_sos().unwrap();

    time::sleep(SECOND * 10 + SLACK).await;

    assert_eq!(h.desk.snapshot(), SosSession::idle());
    let events = drain(&mut h.events);
    assert_eq!(dispatch_count(&events), 1);

    let remaining: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            SosEvent::Tick {
                seconds_remaining, ..
            } => Some(*seconds_remaining),
            _ => None,
        })
        .collect();
    assert_eq!(remaining, (0..10).rev().collect::<Vec<_>>());
    assert_eq!(events.last().map(SosEvent::state), Some(SosState::Idle));

    assert_eq!(
        h.notices.titles(),
        vec!["Emergency SOS Activated", "Emergency Services Contacted"]
    );

    // Nothing more happens afterwards
    time::sleep(SECOND * 30).await;
    assert!(drain(&mut h.events).is_empty());
    assert_eq!(h.notices.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_three_seconds() {
    let mut h = harness();
    h.desk.activate_sos().unwrap();

    time::sleep(SECOND * 3 + SLACK).await;
    assert_eq!(h.desk.snapshot().seconds_remaining, 7);

    h.desk.cancel_sos().unwrap();
    assert_eq!(h.desk.snapshot(), SosSession::idle());

    time::sleep(SECOND * 20).await;
    let events = drain(&mut h.events);
    assert_eq!(dispatch_count(&events), 0);
    assert!(matches!(
        events.last(),
        Some(SosEvent::Cancelled {
            seconds_remaining: 7,
            ..
        })
    ));
    assert_eq!(
        h.notices.titles(),
        vec!["Emergency SOS Activated", "Emergency Cancelled"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancel_at_each_second_never_dispatches() {
    for elapsed in 0..10u32 {
        let mut h = harness();
        h.desk.activate_sos().unwrap();
        time::sleep(SECOND * elapsed + SLACK).await;
        assert_eq!(h.desk.snapshot().seconds_remaining, 10 - elapsed);

        h.desk.cancel_sos().unwrap();
        time::sleep(SECOND * 15).await;

        assert_eq!(h.desk.snapshot(), SosSession::idle());
        assert_eq!(dispatch_count(&drain(&mut h.events)), 0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_rearm_after_cancel_runs_a_fresh_countdown() {
    let mut h = harness();
    let first = h.desk.activate_sos().unwrap();
    time::sleep(SECOND * 4 + SLACK).await;
    h.desk.cancel_sos().unwrap();

    let second = h.desk.activate_sos().unwrap();
    assert_ne!(first, second);
    assert_eq!(h.desk.snapshot().seconds_remaining, 10);

    time::sleep(SECOND * 6 + SLACK).await;
    assert_eq!(h.desk.snapshot().seconds_remaining, 4);

    time::sleep(SECOND * 4).await;
    assert_eq!(h.desk.snapshot(), SosSession::idle());
    assert_eq!(dispatch_count(&drain(&mut h.events)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_activate_twice_is_rejected() {
    let mut h = harness();
    h.desk.activate_sos().unwrap();
    time::sleep(SECOND * 2 + SLACK).await;

    assert_eq!(
        h.desk.activate_sos(),
        Err(EmergencyError::Sos(SosError::AlreadyArmed { remaining: 8 }))
    );

    time::sleep(SECOND * 8).await;
    assert_eq!(dispatch_count(&drain(&mut h.events)), 1);
    assert_eq!(h.notices.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_desk_stops_countdown() {
    let h = harness();
    let Harness {
        mut desk,
        notices,
        mut events,
        ..
    } = h;
    desk.activate_sos().unwrap();
    time::sleep(SECOND * 2 + SLACK).await;
    drop(desk);

    time::sleep(SECOND * 20).await;
    let events = drain(&mut events);
    assert_eq!(dispatch_count(&events), 0);
    assert_eq!(notices.titles(), vec!["Emergency SOS Activated"]);
}

#[tokio::test(start_paused = true)]
async fn test_page_is_locked_while_armed() {
    let mut h = harness();
    h.desk.activate_sos().unwrap();
    assert_eq!(h.desk.back_to_dashboard(), Err(EmergencyError::SosActive));
    assert_eq!(h.desk.call_service("108"), Err(EmergencyError::SosActive));

    time::sleep(SECOND * 10 + SLACK).await;
    h.desk.back_to_dashboard().unwrap();
    assert_eq!(h.navigator.history(), vec![Route::UserDashboard]);
}

#[tokio::test(start_paused = true)]
async fn test_custom_countdown_and_tick_interval() {
    let mut config = AppConfig::default();
    config.sos.countdown_secs = 3;
    config.sos.tick_interval_ms = 100;

    let notices = Arc::new(MemoryNotifier::new());
    let mut desk = EmergencyDesk::new(&config, notices.clone(), Arc::new(HistoryNavigator::new()));
    desk.activate_sos().unwrap();

    time::sleep(Duration::from_millis(250)).await;
    assert_eq!(desk.snapshot().seconds_remaining, 1);

    time::sleep(Duration::from_millis(100)).await;
    assert_eq!(desk.snapshot(), SosSession::idle());
    assert_eq!(
        notices.notices()[0].description,
        "Emergency services will be contacted in 3 seconds..."
    );
}
