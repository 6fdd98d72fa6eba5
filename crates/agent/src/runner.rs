//! Event consumer loop.
//!
//! Subscribes to the monitor's event bus, logs every event with structured
//! fields and prints a fresh [`Report`] after each completed tick.

use std::sync::Arc;

use forestwatch_engine::monitor::Monitor;
use forestwatch_events::MonitorEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::report::{Report, ReportFormat};

/// Log one engine event at a level matching its severity.
pub fn log_event(event: &MonitorEvent) {
    match event {
        MonitorEvent::AlertLevelChanged {
            location_id,
            from,
            to,
            temperature_celsius,
            ..
        } => {
            let from = from.map_or("none", |l| l.as_str());
            if to.is_alert() {
                tracing::warn!(location_id = %location_id, from, to = %to, temperature_celsius, "Alert level raised");
            } else {
                tracing::info!(location_id = %location_id, from, to = %to, temperature_celsius, "Alert level changed");
            }
        }
        MonitorEvent::LocationUnavailable {
            location_id, reason, ..
        } => {
            tracing::warn!(location_id = %location_id, reason = %reason, "Location unavailable");
        }
        MonitorEvent::TickCompleted { recorded, failed, .. } => {
            tracing::debug!(recorded, failed, "Tick completed");
        }
        other => {
            tracing::info!(event = other.name(), "Engine event");
        }
    }
}

/// Consume events until cancelled, printing a report after each tick.
pub async fn run(monitor: Arc<Monitor>, format: ReportFormat, cancel: CancellationToken) {
    let events = monitor.subscribe();
    consume(monitor, events, format, cancel, |report| println!("{report}")).await;
}

/// Drive `events` until cancelled or closed, handing each rendered
/// post-tick report to `emit`.
pub async fn consume(
    monitor: Arc<Monitor>,
    mut events: broadcast::Receiver<MonitorEvent>,
    format: ReportFormat,
    cancel: CancellationToken,
    mut emit: impl FnMut(String) + Send,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => event,
        };

        match event {
            Ok(event) => {
                log_event(&event);
                if matches!(event, MonitorEvent::TickCompleted { .. }) {
                    let report = Report::collect(&monitor).await;
                    emit(report.render(format));
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event consumer lagged behind");
            }
            Err(RecvError::Closed) => break,
        }
    }

    tracing::info!("Event consumer stopped");
}
