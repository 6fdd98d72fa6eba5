//! The monitoring facade.
//!
//! [`Monitor`] owns every piece of mutable engine state: the per-location
//! history, fetch health, and thresholds. It is created once and shared via
//! `Arc<Monitor>` between the [`RefreshScheduler`](crate::scheduler::RefreshScheduler)
//! and the presentation layer.
//!
//! Only [`tick`](Monitor::tick) mutates history. A tick runs in two phases:
//!
//! 1. **Fetch** every location concurrently, each bounded by its own timeout.
//!    No lock is held; queries proceed normally.
//! 2. **Append** all successful readings inside a single write-lock critical
//!    section with no await points.
//!
//! Dropping a tick during phase 1 discards every fetched value, so a cancelled
//! tick never leaves a partial write behind.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use forestwatch_core::alert::{classify, AlertLevel};
use forestwatch_core::history::{History, RetentionPolicy};
use forestwatch_core::location::LocationRegistry;
use forestwatch_core::sample::Sample;
use forestwatch_core::thresholds::{ThresholdBounds, ThresholdConfig, ThresholdSet};
use forestwatch_core::types::{LocationId, Timestamp};
use forestwatch_events::{EventBus, MonitorEvent};
use futures::future::join_all;
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::clock::{Clock, MonotonicClock};
use crate::error::MonitorError;
use crate::snapshot::{
    AlertSummary, FailedFetch, FetchHealth, FrameReading, Playback, Snapshot, SnapshotEntry,
    TickReport, Timeline,
};
use crate::source::{ReadingSource, SourceError};

/// Default upper bound for a single location fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Construction-time settings for a [`Monitor`].
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub thresholds: ThresholdConfig,
    pub retention: RetentionPolicy,
    pub fetch_timeout: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            retention: RetentionPolicy::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// History and fetch health share one lock so a tick's append phase is a
/// single critical section.
#[derive(Debug)]
struct EngineState {
    history: History,
    health: HashMap<LocationId, FetchHealth>,
}

pub struct Monitor {
    registry: LocationRegistry,
    source: Arc<dyn ReadingSource>,
    clock: Arc<dyn Clock>,
    state: RwLock<EngineState>,
    thresholds: RwLock<ThresholdSet>,
    /// Held for the whole duration of a tick.
    tick_guard: Mutex<()>,
    fetch_timeout: Duration,
    bus: EventBus,
}

impl Monitor {
    pub fn new(
        registry: LocationRegistry,
        source: Arc<dyn ReadingSource>,
        options: MonitorOptions,
    ) -> Self {
        Self {
            registry,
            source,
            clock: Arc::new(MonotonicClock::new()),
            state: RwLock::new(EngineState {
                history: History::new(options.retention),
                health: HashMap::new(),
            }),
            thresholds: RwLock::new(ThresholdSet::new(options.thresholds)),
            tick_guard: Mutex::new(()),
            fetch_timeout: options.fetch_timeout,
            bus: EventBus::default(),
        }
    }

    /// Replace the clock used to stamp ticks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &LocationRegistry {
        &self.registry
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.bus.subscribe()
    }

    pub(crate) fn publish(&self, event: MonitorEvent) {
        self.bus.publish(event);
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ---- ticks ----

    /// Sample every location at the clock's current time.
    pub async fn tick(&self) -> Result<TickReport, MonitorError> {
        let at = self.clock.now();
        self.tick_at(at).await
    }

    /// Sample every location against the logical timestamp `at`.
    ///
    /// Fails with [`MonitorError::TickInProgress`] if another tick is running.
    /// Per-location fetch failures never fail the tick; they are listed in
    /// the returned report and the affected locations are marked stale.
    pub async fn tick_at(&self, at: Timestamp) -> Result<TickReport, MonitorError> {
        let _guard = self
            .tick_guard
            .try_lock()
            .map_err(|_| MonitorError::TickInProgress)?;

        // Thresholds in effect when the tick starts; later updates apply to
        // the next tick.
        let thresholds = self.thresholds.read().await.clone();

        let fetches = self
            .registry
            .list_locations()
            .iter()
            .map(|loc| async move { (loc.id.clone(), self.fetch_one(&loc.id, at).await) });
        let results = join_all(fetches).await;

        let mut report = TickReport::new(at);
        let mut events = Vec::new();

        {
            let mut state = self.state.write().await;
            let EngineState { history, health } = &mut *state;

            for (location_id, result) in results {
                let location_health = health.entry(location_id.clone()).or_default();

                let temperature = match result {
                    Ok(temperature) => temperature,
                    Err(e) => {
                        tracing::warn!(
                            location_id = %location_id,
                            source = self.source.name(),
                            error = %e,
                            "Skipping location for this tick",
                        );
                        location_health.record_failure(at, e.to_string());
                        events.push(MonitorEvent::LocationUnavailable {
                            location_id: location_id.clone(),
                            at,
                            reason: e.to_string(),
                        });
                        report.failed.push(FailedFetch {
                            location_id,
                            reason: e.to_string(),
                        });
                        continue;
                    }
                };

                let location_thresholds = thresholds.for_location(&location_id);
                let previous_level = history
                    .latest(&location_id)
                    .map(|s| classify(s.temperature_celsius, &location_thresholds));

                let sample = Sample::new(location_id.clone(), at, temperature);
                match history.append(&location_id, sample) {
                    Ok(evicted) => {
                        location_health.record_success(at);
                        report.evicted += evicted;
                        report.recorded.push(location_id.clone());

                        let level = classify(temperature, &location_thresholds);
                        if previous_level != Some(level) {
                            events.push(MonitorEvent::AlertLevelChanged {
                                location_id,
                                from: previous_level,
                                to: level,
                                temperature_celsius: temperature,
                                at,
                            });
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            location_id = %location_id,
                            error = %e,
                            "Dropping sample rejected by history",
                        );
                        location_health.record_failure(at, e.to_string());
                        report.failed.push(FailedFetch {
                            location_id,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        for event in events {
            self.bus.publish(event);
        }
        self.bus.publish(MonitorEvent::TickCompleted {
            at,
            recorded: report.recorded.len(),
            failed: report.failed.len(),
        });

        tracing::info!(
            at = %at,
            recorded = report.recorded.len(),
            failed = report.failed.len(),
            evicted = report.evicted,
            "Tick completed",
        );

        Ok(report)
    }

    /// Fetch one location, bounded by the per-location timeout.
    async fn fetch_one(&self, location_id: &LocationId, at: Timestamp) -> Result<f64, SourceError> {
        match tokio::time::timeout(self.fetch_timeout, self.source.fetch(location_id, at)).await {
            Ok(Ok(temperature)) if temperature.is_finite() => Ok(temperature),
            Ok(Ok(temperature)) => Err(SourceError::unavailable(
                location_id,
                format!("non-finite reading {temperature}"),
            )),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SourceError::Timeout {
                location_id: location_id.clone(),
                timeout_ms: self.fetch_timeout.as_millis() as u64,
            }),
        }
    }

    // ---- queries ----

    /// Latest sample and alert level of every location, classified with the
    /// thresholds in effect right now.
    pub async fn current_snapshot(&self) -> Snapshot {
        let thresholds = self.thresholds.read().await.clone();
        let state = self.state.read().await;

        let mut entries = BTreeMap::new();
        let mut unavailable = Vec::new();

        for location in self.registry.list_locations() {
            let id = &location.id;
            let Some(latest) = state.history.latest(id) else {
                unavailable.push(id.clone());
                continue;
            };

            let health = state.health.get(id);
            let change = state
                .history
                .previous(id)
                .map(|prev| latest.temperature_celsius - prev.temperature_celsius);

            let location_thresholds = thresholds.for_location(id);
            entries.insert(
                id.clone(),
                SnapshotEntry {
                    location_id: id.clone(),
                    name: location.name.clone(),
                    sample: latest.clone(),
                    level: classify(latest.temperature_celsius, &location_thresholds),
                    thresholds: location_thresholds,
                    change,
                    stale: health.is_some_and(FetchHealth::is_stale),
                    last_error: health.and_then(|h| h.last_error.clone()),
                },
            );
        }

        Snapshot {
            taken_at: self.clock.now(),
            entries,
            unavailable,
        }
    }

    pub async fn alert_summary(&self) -> AlertSummary {
        AlertSummary::from_snapshot(&self.current_snapshot().await)
    }

    /// Samples of one location with `from <= timestamp <= to`.
    ///
    /// An empty range (including `from > to`) is not an error.
    pub async fn history(
        &self,
        location_id: &LocationId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Playback, MonitorError> {
        self.registry.get(location_id)?;
        let thresholds = self.thresholds.read().await.for_location(location_id);
        let samples = self
            .state
            .read()
            .await
            .history
            .range(location_id, from, to)
            .cloned()
            .collect();
        Ok(Playback::new(location_id.clone(), thresholds, samples))
    }

    /// All locations' samples in `[from, to]`, grouped into one frame per
    /// tick timestamp.
    pub async fn timeline(&self, from: Timestamp, to: Timestamp) -> Timeline {
        let thresholds = self.thresholds.read().await.clone();
        let state = self.state.read().await;

        let mut frames: BTreeMap<Timestamp, BTreeMap<LocationId, FrameReading>> = BTreeMap::new();
        for id in self.registry.ids() {
            let location_thresholds = thresholds.for_location(id);
            for sample in state.history.range(id, from, to) {
                frames.entry(sample.timestamp).or_default().insert(
                    id.clone(),
                    FrameReading {
                        temperature_celsius: sample.temperature_celsius,
                        level: classify(sample.temperature_celsius, &location_thresholds),
                    },
                );
            }
        }

        Timeline::from_frames(frames)
    }

    pub async fn latest(&self, location_id: &LocationId) -> Result<Option<Sample>, MonitorError> {
        self.registry.get(location_id)?;
        Ok(self.state.read().await.history.latest(location_id).cloned())
    }

    pub async fn fetch_health(&self, location_id: &LocationId) -> Result<FetchHealth, MonitorError> {
        self.registry.get(location_id)?;
        Ok(self
            .state
            .read()
            .await
            .health
            .get(location_id)
            .cloned()
            .unwrap_or_default())
    }

    /// Timestamp of the last tick that attempted each location.
    pub async fn last_ticks(&self) -> BTreeMap<LocationId, Timestamp> {
        self.state
            .read()
            .await
            .health
            .iter()
            .filter_map(|(id, h)| h.last_attempt.map(|at| (id.clone(), at)))
            .collect()
    }

    // ---- thresholds ----

    pub async fn thresholds(&self) -> ThresholdConfig {
        self.thresholds.read().await.global()
    }

    pub async fn thresholds_for(&self, location_id: &LocationId) -> Result<ThresholdConfig, MonitorError> {
        self.registry.get(location_id)?;
        Ok(self.thresholds.read().await.for_location(location_id))
    }

    /// Validate and replace the global thresholds.
    ///
    /// On failure nothing changes.
    pub async fn update_thresholds(
        &self,
        bounds: ThresholdBounds,
    ) -> Result<ThresholdConfig, MonitorError> {
        let config = ThresholdConfig::try_from(bounds)?;
        self.thresholds.write().await.set_global(config);

        tracing::info!(
            normal = config.normal(),
            warning = config.warning(),
            danger = config.danger(),
            "Thresholds updated",
        );
        self.bus.publish(MonitorEvent::ThresholdsUpdated {
            location_id: None,
            thresholds: Some(config),
        });
        Ok(config)
    }

    /// Set (`Some`) or clear (`None`) a per-location threshold override.
    pub async fn set_location_thresholds(
        &self,
        location_id: &LocationId,
        bounds: Option<ThresholdBounds>,
    ) -> Result<Option<ThresholdConfig>, MonitorError> {
        self.registry.get(location_id)?;
        let config = bounds.map(ThresholdConfig::try_from).transpose()?;

        self.thresholds
            .write()
            .await
            .set_override(location_id.clone(), config);

        tracing::info!(location_id = %location_id, cleared = config.is_none(), "Location thresholds updated");
        self.bus.publish(MonitorEvent::ThresholdsUpdated {
            location_id: Some(location_id.clone()),
            thresholds: config,
        });
        Ok(config)
    }

    /// Classify an arbitrary temperature for a location with the current
    /// thresholds.
    pub async fn classify_for(
        &self,
        location_id: &LocationId,
        temperature_celsius: f64,
    ) -> Result<AlertLevel, MonitorError> {
        let thresholds = self.thresholds_for(location_id).await?;
        Ok(classify(temperature_celsius, &thresholds))
    }
}
