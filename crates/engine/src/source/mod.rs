//! Reading source contract and its implementations.
//!
//! The engine only knows the [`ReadingSource`] trait: given a location and a
//! point in time, return a temperature in °C or fail. Every failure is
//! treated as transient; the monitor skips the location for the current tick
//! and retries on the next one.

pub mod fallback;
pub mod openweather;
pub mod replay;
pub mod simulated;

use async_trait::async_trait;
use forestwatch_core::types::{LocationId, Timestamp};

pub use fallback::FallbackSource;
pub use openweather::OpenWeatherSource;
pub use replay::ReplaySource;
pub use simulated::SimulatedSource;

/// Why a reading could not be obtained.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    /// Network, sensor or upstream outage.
    #[error("Source unavailable for {location_id}: {reason}")]
    Unavailable {
        location_id: LocationId,
        reason: String,
    },

    /// The fetch exceeded the per-location timeout.
    #[error("Fetch for {location_id} timed out after {timeout_ms}ms")]
    Timeout {
        location_id: LocationId,
        timeout_ms: u64,
    },

    /// The source has no mapping for this location.
    #[error("Source has no reading for unknown location {0}")]
    UnknownLocation(LocationId),
}

impl SourceError {
    pub fn unavailable(location_id: &LocationId, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            location_id: location_id.clone(),
            reason: reason.into(),
        }
    }

    /// `false` only for configuration mismatches that retrying cannot fix.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::UnknownLocation(_))
    }
}

/// Supplies a temperature for a location at a point in time.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    async fn fetch(&self, location_id: &LocationId, at: Timestamp) -> Result<f64, SourceError>;

    /// Short label used in logs.
    fn name(&self) -> &'static str;
}
