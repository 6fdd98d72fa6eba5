#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use forestwatch_core::location::{Location, LocationRegistry};
use forestwatch_core::types::{LocationId, Timestamp};
use forestwatch_engine::clock::ManualClock;
use forestwatch_engine::monitor::{Monitor, MonitorOptions};
use forestwatch_engine::source::{ReadingSource, SourceError};

/// A reading source whose output each test controls directly.
///
/// Every location returns its configured temperature (default 20°C) unless it
/// is marked as failing. Per-location delays simulate slow upstreams.
#[derive(Default)]
pub struct ScriptedSource {
    temps: Mutex<HashMap<LocationId, f64>>,
    failing: Mutex<HashSet<LocationId>>,
    delays: Mutex<HashMap<LocationId, Duration>>,
    calls: Mutex<usize>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_temp(&self, id: &str, temp: f64) {
        self.temps.lock().unwrap().insert(id.into(), temp);
    }

    pub fn fail(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.into());
    }

    pub fn recover(&self, id: &str) {
        self.failing.lock().unwrap().remove(&LocationId::from(id));
    }

    pub fn delay(&self, id: &str, by: Duration) {
        self.delays.lock().unwrap().insert(id.into(), by);
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ReadingSource for ScriptedSource {
    async fn fetch(&self, location_id: &LocationId, _at: Timestamp) -> Result<f64, SourceError> {
        *self.calls.lock().unwrap() += 1;

        let delay = self.delays.lock().unwrap().get(location_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().unwrap().contains(location_id) {
            return Err(SourceError::unavailable(location_id, "sensor offline"));
        }
        Ok(self
            .temps
            .lock()
            .unwrap()
            .get(location_id)
            .copied()
            .unwrap_or(20.0))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Registry with three locations `a`, `b`, `c`.
pub fn abc_registry() -> LocationRegistry {
    LocationRegistry::new(vec![
        Location::new("a", "Forest A", 10.0, 10.0, "Test"),
        Location::new("b", "Forest B", 20.0, 20.0, "Test"),
        Location::new("c", "Forest C", 30.0, 30.0, "Test"),
    ])
    .unwrap()
}

pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
}

pub fn secs(n: i64) -> Timestamp {
    t0() + chrono::Duration::seconds(n)
}

/// Monitor over `a`, `b`, `c` with a manual clock starting at [`t0`].
pub fn abc_monitor(
    source: Arc<ScriptedSource>,
    options: MonitorOptions,
) -> (Arc<Monitor>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    let monitor = Monitor::new(abc_registry(), source, options).with_clock(clock.clone());
    (Arc::new(monitor), clock)
}
