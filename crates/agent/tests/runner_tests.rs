//! Integration tests for the agent's event consumer loop.

use std::sync::Arc;
use std::time::Duration;

use forestwatch_agent::report::{Report, ReportFormat};
use forestwatch_agent::runner;
use forestwatch_core::location::LocationRegistry;
use forestwatch_engine::monitor::{Monitor, MonitorOptions};
use forestwatch_engine::source::SimulatedSource;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn monitor() -> Arc<Monitor> {
    let registry = LocationRegistry::forests();
    let source = Arc::new(SimulatedSource::new(&registry));
    Arc::new(Monitor::new(registry, source, MonitorOptions::default()))
}

// ---------------------------------------------------------------------------
// Test: consumer emits reports and exits on cancellation
// ---------------------------------------------------------------------------

/// Each completed tick yields a rendered report, and the loop stops
/// promptly once cancelled.
#[tokio::test]
async fn consumer_emits_report_per_tick_and_stops_on_cancel() {
    let monitor = monitor();
    let cancel = CancellationToken::new();
    let (tx, mut reports) = mpsc::unbounded_channel();
    let consumer = tokio::spawn(runner::consume(
        Arc::clone(&monitor),
        monitor.subscribe(),
        ReportFormat::Json,
        cancel.clone(),
        move |report| {
            let _ = tx.send(report);
        },
    ));

    monitor.tick().await.unwrap();

    let rendered = tokio::time::timeout(Duration::from_secs(5), reports.recv())
        .await
        .expect("a report should follow the tick")
        .expect("consumer still running");
    let json: serde_json::Value = serde_json::from_str(&rendered).expect("valid JSON");
    assert_eq!(json["locations"].as_array().unwrap().len(), 10);
    assert!(json["unavailable"].as_array().unwrap().is_empty());

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), consumer)
        .await
        .expect("consumer should exit after cancel")
        .unwrap();
}

// ---------------------------------------------------------------------------
// Test: collected report covers the whole catalog
// ---------------------------------------------------------------------------

/// After one simulated tick every forest appears in the report.
#[tokio::test]
async fn collected_report_covers_catalog() {
    let monitor = monitor();
    monitor.tick().await.unwrap();

    let report = Report::collect(&monitor).await;
    assert_eq!(report.locations.len(), 10);
    assert!(report.unavailable.is_empty());
    assert_eq!(
        report.summary.normal + report.summary.warning + report.summary.danger,
        10
    );
}
