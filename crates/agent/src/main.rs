//! `forestwatch-agent` -- headless forest temperature monitor.
//!
//! Samples every catalogued forest on a fixed interval, keeps a rolling
//! history in memory and prints a report after each tick. Alert level
//! changes are logged as they happen.
//!
//! # Environment variables
//!
//! Engine settings (`REFRESH_INTERVAL_SECS`, thresholds, history retention,
//! `OPENWEATHER_API_KEY`, ...) are documented in
//! `forestwatch_engine::config`. The agent adds:
//!
//! | Variable        | Required | Default | Description                  |
//! |-----------------|----------|---------|------------------------------|
//! | `REPORT_FORMAT` | no       | `text`  | `text` or `json` report output |

use std::sync::Arc;

use forestwatch_agent::report::ReportFormat;
use forestwatch_agent::runner;
use forestwatch_core::location::LocationRegistry;
use forestwatch_engine::config::MonitorConfig;
use forestwatch_engine::monitor::Monitor;
use forestwatch_engine::scheduler::RefreshScheduler;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forestwatch_agent=info,forestwatch_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MonitorConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let format: ReportFormat = std::env::var("REPORT_FORMAT")
        .ok()
        .map(|v| v.parse::<ReportFormat>())
        .transpose()
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Invalid REPORT_FORMAT");
            std::process::exit(1);
        })
        .unwrap_or_default();

    let registry = LocationRegistry::forests();
    let source = config.build_source(&registry).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build reading source");
        std::process::exit(1);
    });

    tracing::info!(
        locations = registry.len(),
        source = source.name(),
        interval_secs = config.refresh_interval.as_duration().as_secs_f64(),
        "Starting forestwatch-agent",
    );

    let monitor = Arc::new(Monitor::new(registry, source, config.options()));
    let scheduler = RefreshScheduler::new(Arc::clone(&monitor));

    let cancel = CancellationToken::new();
    let consumer = tokio::spawn(runner::run(Arc::clone(&monitor), format, cancel.clone()));

    if let Err(e) = scheduler.start(config.refresh_interval.as_duration()).await {
        tracing::error!(error = %e, "Failed to start refresh scheduler");
        std::process::exit(1);
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }

    tracing::info!("Shutting down");
    scheduler.stop().await;
    cancel.cancel();
    let _ = consumer.await;
}
