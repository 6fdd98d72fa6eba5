//! Human and machine readable snapshot reports.
//!
//! A [`Report`] is built from a [`Snapshot`] and rendered as aligned text
//! lines or as JSON.

use std::fmt::Write as _;
use std::str::FromStr;

use forestwatch_core::alert::AlertLevel;
use forestwatch_core::thresholds::ThresholdConfig;
use forestwatch_core::types::{LocationId, Timestamp};
use forestwatch_engine::monitor::Monitor;
use forestwatch_engine::snapshot::{AlertSummary, Snapshot};
use serde::Serialize;

/// Output format selected with `REPORT_FORMAT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown report format {other:?}, expected \"text\" or \"json\"")),
        }
    }
}

/// Operator-facing alert text for a level, or `None` when normal.
pub fn alert_message(level: AlertLevel, thresholds: &ThresholdConfig) -> Option<String> {
    match level {
        AlertLevel::Normal => None,
        AlertLevel::Warning => Some(format!(
            "WARNING: Temperature exceeds warning threshold of {}°C. Increased fire risk!",
            thresholds.warning()
        )),
        AlertLevel::Danger => Some(format!(
            "DANGER: Temperature exceeds critical threshold of {}°C. Fire risk is VERY HIGH!",
            thresholds.danger()
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationLine {
    pub location_id: LocationId,
    pub name: String,
    pub temperature_celsius: f64,
    pub level: AlertLevel,
    pub change: Option<f64>,
    pub stale: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub taken_at: Timestamp,
    pub summary: AlertSummary,
    pub locations: Vec<LocationLine>,
    pub unavailable: Vec<LocationId>,
}

impl Report {
    /// Build from a snapshot. Alert messages quote the thresholds each entry
    /// was classified with.
    pub fn build(snapshot: &Snapshot) -> Self {
        let locations = snapshot
            .entries
            .values()
            .map(|entry| LocationLine {
                location_id: entry.location_id.clone(),
                name: entry.name.clone(),
                temperature_celsius: entry.sample.temperature_celsius,
                level: entry.level,
                change: entry.change,
                stale: entry.stale,
                message: alert_message(entry.level, &entry.thresholds),
            })
            .collect();

        Self {
            taken_at: snapshot.taken_at,
            summary: AlertSummary::from_snapshot(snapshot),
            locations,
            unavailable: snapshot.unavailable.clone(),
        }
    }

    /// Snapshot the monitor and build a report from it.
    pub async fn collect(monitor: &Monitor) -> Self {
        Self::build(&monitor.current_snapshot().await)
    }

    pub fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Text => self.render_text(),
            ReportFormat::Json => {
                serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
            }
        }
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Forest temperatures at {} | normal {} | warning {} | danger {}",
            self.taken_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.summary.normal,
            self.summary.warning,
            self.summary.danger,
        );

        for line in &self.locations {
            let change = line
                .change
                .map(|c| format!(" ({c:+.1})"))
                .unwrap_or_default();
            let stale = if line.stale { " [stale]" } else { "" };
            let _ = writeln!(
                out,
                "  {:<32} {:>6.1}°C  {:<7}{change}{stale}",
                line.name,
                line.temperature_celsius,
                line.level.as_str().to_uppercase(),
            );
            if let Some(message) = &line.message {
                let _ = writeln!(out, "    {message}");
            }
        }

        for id in &self.unavailable {
            let _ = writeln!(out, "  {:<32} no data", id.as_str());
        }
        out
    }
}
