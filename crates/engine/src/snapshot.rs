//! Read models returned by the [`Monitor`](crate::monitor::Monitor) facade.
//!
//! Everything here is an owned copy taken under the monitor's lock; callers
//! can hold these values as long as they like without blocking ticks. Alert
//! levels are computed when the view is built and never written back.

use std::collections::BTreeMap;

use forestwatch_core::alert::{classify, AlertLevel};
use forestwatch_core::sample::Sample;
use forestwatch_core::thresholds::ThresholdConfig;
use forestwatch_core::types::{LocationId, Timestamp};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Fetch health
// ---------------------------------------------------------------------------

/// Outcome history of the most recent fetch attempts for one location.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchHealth {
    pub last_attempt: Option<Timestamp>,
    pub last_success: Option<Timestamp>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

impl FetchHealth {
    /// The most recent attempt failed; the last good sample is out of date.
    pub fn is_stale(&self) -> bool {
        self.consecutive_failures > 0
    }

    pub(crate) fn record_success(&mut self, at: Timestamp) {
        self.last_attempt = Some(at);
        self.last_success = Some(at);
        self.consecutive_failures = 0;
        self.last_error = None;
    }

    pub(crate) fn record_failure(&mut self, at: Timestamp, reason: String) {
        self.last_attempt = Some(at);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(reason);
    }
}

// ---------------------------------------------------------------------------
// Tick report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedFetch {
    pub location_id: LocationId,
    pub reason: String,
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    /// Logical timestamp shared by every sample of this tick.
    pub at: Timestamp,
    pub recorded: Vec<LocationId>,
    pub failed: Vec<FailedFetch>,
    /// Samples dropped by the retention cap during this tick.
    pub evicted: usize,
}

impl TickReport {
    pub(crate) fn new(at: Timestamp) -> Self {
        Self {
            at,
            recorded: Vec::new(),
            failed: Vec::new(),
            evicted: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Latest known state of one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry {
    pub location_id: LocationId,
    pub name: String,
    pub sample: Sample,
    pub level: AlertLevel,
    /// Bounds `level` was computed with.
    pub thresholds: ThresholdConfig,
    /// Difference from the previous sample, in °C.
    pub change: Option<f64>,
    /// The last fetch failed; `sample` is the last good reading.
    pub stale: bool,
    pub last_error: Option<String>,
}

/// Current view across all locations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub taken_at: Timestamp,
    pub entries: BTreeMap<LocationId, SnapshotEntry>,
    /// Locations that have never been sampled successfully.
    pub unavailable: Vec<LocationId>,
}

impl Snapshot {
    pub fn get(&self, location_id: &LocationId) -> Option<&SnapshotEntry> {
        self.entries.get(location_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose latest fetch failed.
    pub fn stale(&self) -> impl Iterator<Item = &SnapshotEntry> {
        self.entries.values().filter(|e| e.stale)
    }
}

// ---------------------------------------------------------------------------
// Alert summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationAlert {
    pub location_id: LocationId,
    pub name: String,
    pub level: AlertLevel,
    pub temperature_celsius: f64,
    pub stale: bool,
}

impl From<&SnapshotEntry> for LocationAlert {
    fn from(entry: &SnapshotEntry) -> Self {
        Self {
            location_id: entry.location_id.clone(),
            name: entry.name.clone(),
            level: entry.level,
            temperature_celsius: entry.sample.temperature_celsius,
            stale: entry.stale,
        }
    }
}

/// Per-level counts and the locations currently above normal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertSummary {
    pub normal: usize,
    pub warning: usize,
    pub danger: usize,
    pub highest: AlertLevel,
    pub hottest: Option<LocationAlert>,
    /// Warning and danger locations, most severe and hottest first.
    pub alerts: Vec<LocationAlert>,
}

impl AlertSummary {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut summary = Self {
            normal: 0,
            warning: 0,
            danger: 0,
            highest: AlertLevel::Normal,
            hottest: None,
            alerts: Vec::new(),
        };

        for entry in snapshot.entries.values() {
            match entry.level {
                AlertLevel::Normal => summary.normal += 1,
                AlertLevel::Warning => summary.warning += 1,
                AlertLevel::Danger => summary.danger += 1,
            }
            summary.highest = summary.highest.max(entry.level);

            let hotter = summary
                .hottest
                .as_ref()
                .map_or(true, |h| entry.sample.temperature_celsius > h.temperature_celsius);
            if hotter {
                summary.hottest = Some(entry.into());
            }

            if entry.level.is_alert() {
                summary.alerts.push(entry.into());
            }
        }

        summary.alerts.sort_by(|a, b| {
            b.level
                .cmp(&a.level)
                .then(b.temperature_celsius.total_cmp(&a.temperature_celsius))
        });
        summary
    }
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// Samples of one location over a time range, classified on iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Playback {
    pub location_id: LocationId,
    pub thresholds: ThresholdConfig,
    samples: Vec<Sample>,
}

impl Playback {
    pub(crate) fn new(location_id: LocationId, thresholds: ThresholdConfig, samples: Vec<Sample>) -> Self {
        Self {
            location_id,
            thresholds,
            samples,
        }
    }

    /// Iterate oldest first. Each call restarts from the beginning.
    pub fn iter(&self) -> impl Iterator<Item = (&Sample, AlertLevel)> + Clone + '_ {
        let thresholds = self.thresholds;
        self.samples
            .iter()
            .map(move |s| (s, classify(s.temperature_celsius, &thresholds)))
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameReading {
    pub temperature_celsius: f64,
    pub level: AlertLevel,
}

/// Every location's reading at one tick timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub at: Timestamp,
    pub readings: BTreeMap<LocationId, FrameReading>,
}

/// Frames in ascending time order, for animated playback.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Timeline {
    pub frames: Vec<Frame>,
}

impl Timeline {
    pub(crate) fn from_frames(frames: BTreeMap<Timestamp, BTreeMap<LocationId, FrameReading>>) -> Self {
        Self {
            frames: frames
                .into_iter()
                .map(|(at, readings)| Frame { at, readings })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
