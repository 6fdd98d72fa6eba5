//! Refresh scheduling types shared by the engine and its consumers.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{LocationId, Timestamp};

/// Default interval between refresh ticks (15 minutes).
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// A validated, strictly positive refresh interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshInterval(Duration);

impl RefreshInterval {
    pub fn new(interval: Duration) -> Result<Self, CoreError> {
        if interval.is_zero() {
            return Err(CoreError::InvalidInterval(
                "interval must be positive".to_string(),
            ));
        }
        Ok(Self(interval))
    }

    pub fn from_secs(secs: u64) -> Result<Self, CoreError> {
        Self::new(Duration::from_secs(secs))
    }

    /// Build from fractional seconds, as supplied by slider-style inputs.
    pub fn from_secs_f64(secs: f64) -> Result<Self, CoreError> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(CoreError::InvalidInterval(format!(
                "interval must be a positive number of seconds, got {secs}"
            )));
        }
        let interval = Duration::try_from_secs_f64(secs)
            .map_err(|e| CoreError::InvalidInterval(format!("{secs}s: {e}")))?;
        Self::new(interval)
    }

    pub fn as_duration(self) -> Duration {
        self.0
    }
}

impl Default for RefreshInterval {
    fn default() -> Self {
        Self(DEFAULT_REFRESH_INTERVAL)
    }
}

impl Serialize for RefreshInterval {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0.as_secs_f64())
    }
}

/// Lifecycle state of the refresh scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Stopped,
    Running,
    Paused,
}

impl SchedulerState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of the scheduler for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshState {
    pub state: SchedulerState,
    /// Interval in seconds.
    pub interval: RefreshInterval,
    /// Timestamp of the last tick that attempted each location.
    pub last_tick: BTreeMap<LocationId, Timestamp>,
}
