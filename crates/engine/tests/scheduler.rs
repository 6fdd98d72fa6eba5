//! Integration tests for `RefreshScheduler`.
//!
//! All timing tests run on paused tokio time, so sleeps advance instantly
//! and tick counts are exact. The monitor uses its default monotonic clock,
//! which follows paused time.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{abc_registry, ScriptedSource};
use forestwatch_core::error::CoreError;
use forestwatch_core::refresh::SchedulerState;
use forestwatch_core::types::LocationId;
use forestwatch_engine::error::MonitorError;
use forestwatch_engine::monitor::{Monitor, MonitorOptions};
use forestwatch_engine::scheduler::RefreshScheduler;
use forestwatch_events::MonitorEvent;
use tokio::time::sleep;

fn scheduler(source: Arc<ScriptedSource>) -> RefreshScheduler {
    let monitor = Monitor::new(abc_registry(), source, MonitorOptions::default());
    RefreshScheduler::new(Arc::new(monitor))
}

async fn sample_count(scheduler: &RefreshScheduler) -> usize {
    let monitor = scheduler.monitor();
    let now = monitor.now();
    monitor
        .history(&LocationId::from("a"), now - chrono::Duration::days(1), now)
        .await
        .unwrap()
        .len()
}

// ---------------------------------------------------------------------------
// Test: start / pause / resume timing
// ---------------------------------------------------------------------------

/// Ticks fire immediately and then every interval; nothing fires while
/// paused and missed ticks are not replayed on resume.
#[tokio::test(start_paused = true)]
async fn ticks_follow_interval_and_pause() {
    let scheduler = scheduler(ScriptedSource::new());

    scheduler.start(Duration::from_secs(5)).await.unwrap();
    assert_eq!(scheduler.state().await, SchedulerState::Running);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(sample_count(&scheduler).await, 1);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(sample_count(&scheduler).await, 2);

    scheduler.pause().await.unwrap();
    sleep(Duration::from_secs(20)).await;
    assert_eq!(sample_count(&scheduler).await, 2);

    scheduler.resume().await.unwrap();
    sleep(Duration::from_secs(5)).await;
    assert_eq!(sample_count(&scheduler).await, 3);

    scheduler.stop().await;
}

// ---------------------------------------------------------------------------
// Test: invalid interval
// ---------------------------------------------------------------------------

/// A zero interval is rejected and the scheduler stays stopped.
#[tokio::test]
async fn start_rejects_zero_interval() {
    let scheduler = scheduler(ScriptedSource::new());

    assert_matches!(
        scheduler.start(Duration::ZERO).await,
        Err(MonitorError::Core(CoreError::InvalidInterval(_)))
    );
    assert_eq!(scheduler.state().await, SchedulerState::Stopped);
    assert!(scheduler.set_interval(Duration::ZERO).await.is_err());
}

// ---------------------------------------------------------------------------
// Test: invalid transitions
// ---------------------------------------------------------------------------

/// Operations outside the state machine fail with InvalidTransition.
#[tokio::test(start_paused = true)]
async fn rejects_invalid_transitions() {
    let scheduler = scheduler(ScriptedSource::new());

    assert_matches!(
        scheduler.pause().await,
        Err(MonitorError::InvalidTransition {
            from: SchedulerState::Stopped,
            action: "pause"
        })
    );
    assert!(scheduler.resume().await.is_err());

    scheduler.start(Duration::from_secs(5)).await.unwrap();
    assert_matches!(
        scheduler.start(Duration::from_secs(5)).await,
        Err(MonitorError::InvalidTransition {
            from: SchedulerState::Running,
            ..
        })
    );
    assert!(scheduler.resume().await.is_err());

    scheduler.pause().await.unwrap();
    assert!(scheduler.pause().await.is_err());

    // Start from Paused resumes.
    scheduler.start(Duration::from_secs(10)).await.unwrap();
    assert_eq!(scheduler.state().await, SchedulerState::Running);
    assert_eq!(scheduler.interval().await.as_duration(), Duration::from_secs(10));

    scheduler.stop().await;
}

// ---------------------------------------------------------------------------
// Test: stop keeps history
// ---------------------------------------------------------------------------

/// Stopping releases the loop but history stays queryable, and a restart
/// appends to it.
#[tokio::test(start_paused = true)]
async fn stop_preserves_history() {
    let source = ScriptedSource::new();
    let scheduler = scheduler(source.clone());

    scheduler.start(Duration::from_secs(5)).await.unwrap();
    sleep(Duration::from_secs(6)).await;
    scheduler.stop().await;
    assert_eq!(scheduler.state().await, SchedulerState::Stopped);
    assert_eq!(sample_count(&scheduler).await, 2);

    let calls = source.calls();
    sleep(Duration::from_secs(60)).await;
    assert_eq!(source.calls(), calls, "no fetches after stop");
    assert_eq!(sample_count(&scheduler).await, 2);

    scheduler.start(Duration::from_secs(5)).await.unwrap();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(sample_count(&scheduler).await, 3);

    scheduler.stop().await;
    // Stopping twice is fine.
    scheduler.stop().await;
}

// ---------------------------------------------------------------------------
// Test: stop during a tick discards its results
// ---------------------------------------------------------------------------

/// A tick cancelled while fetching appends nothing.
#[tokio::test(start_paused = true)]
async fn stop_mid_tick_appends_nothing() {
    let source = ScriptedSource::new();
    source.delay("c", Duration::from_secs(8));
    let scheduler = scheduler(source);

    scheduler.start(Duration::from_secs(60)).await.unwrap();
    sleep(Duration::from_secs(1)).await;
    scheduler.stop().await;

    assert_eq!(sample_count(&scheduler).await, 0);
    assert!(scheduler.monitor().current_snapshot().await.is_empty());
}

// ---------------------------------------------------------------------------
// Test: set_interval
// ---------------------------------------------------------------------------

/// A shorter interval reschedules the next tick from the previous one
/// without clearing history.
#[tokio::test(start_paused = true)]
async fn set_interval_reschedules_next_tick() {
    let scheduler = scheduler(ScriptedSource::new());
    let mut events = scheduler.monitor().subscribe();

    scheduler.start(Duration::from_secs(900)).await.unwrap();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(sample_count(&scheduler).await, 1);

    scheduler.set_interval(Duration::from_secs(5)).await.unwrap();
    sleep(Duration::from_secs(5)).await;
    assert_eq!(sample_count(&scheduler).await, 2);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(sample_count(&scheduler).await, 3);

    let mut saw_interval = false;
    while let Ok(event) = events.try_recv() {
        if event == (MonitorEvent::IntervalChanged { interval_secs: 5.0 }) {
            saw_interval = true;
        }
    }
    assert!(saw_interval);

    scheduler.stop().await;
}

// ---------------------------------------------------------------------------
// Test: refresh_now and refresh_state
// ---------------------------------------------------------------------------

/// A manual refresh works while stopped and shows up in the refresh state.
#[tokio::test]
async fn refresh_now_while_stopped() {
    let scheduler = scheduler(ScriptedSource::new());

    let report = scheduler.refresh_now().await.unwrap();
    assert!(report.is_complete());

    let state = scheduler.refresh_state().await;
    assert_eq!(state.state, SchedulerState::Stopped);
    assert_eq!(state.last_tick.len(), 3);
    assert_eq!(state.last_tick[&LocationId::from("a")], report.at);
}

// ---------------------------------------------------------------------------
// Test: state change events
// ---------------------------------------------------------------------------

/// Every transition publishes SchedulerStateChanged.
#[tokio::test(start_paused = true)]
async fn publishes_state_changes() {
    let scheduler = scheduler(ScriptedSource::new());
    let mut events = scheduler.monitor().subscribe();

    scheduler.start(Duration::from_secs(5)).await.unwrap();
    scheduler.pause().await.unwrap();
    scheduler.stop().await;

    let mut transitions = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let MonitorEvent::SchedulerStateChanged { from, to } = event {
            transitions.push((from, to));
        }
    }
    assert_eq!(
        transitions,
        [
            (SchedulerState::Stopped, SchedulerState::Running),
            (SchedulerState::Running, SchedulerState::Paused),
            (SchedulerState::Paused, SchedulerState::Stopped),
        ]
    );
}
