//! Replays previously recorded readings.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use forestwatch_core::sample::Sample;
use forestwatch_core::types::{LocationId, Timestamp};

use super::{ReadingSource, SourceError};

/// Serves, for each request, the latest recorded reading at or before `at`.
#[derive(Debug, Default, Clone)]
pub struct ReplaySource {
    readings: HashMap<LocationId, BTreeMap<Timestamp, f64>>,
}

impl ReplaySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a Sample>) -> Self {
        let mut source = Self::new();
        for sample in samples {
            source.record(
                sample.location_id.clone(),
                sample.timestamp,
                sample.temperature_celsius,
            );
        }
        source
    }

    /// Add a reading; a later call for the same instant replaces it.
    pub fn record(&mut self, location_id: LocationId, at: Timestamp, temperature_celsius: f64) {
        self.readings
            .entry(location_id)
            .or_default()
            .insert(at, temperature_celsius);
    }

    pub fn len(&self) -> usize {
        self.readings.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReadingSource for ReplaySource {
    async fn fetch(&self, location_id: &LocationId, at: Timestamp) -> Result<f64, SourceError> {
        self.readings
            .get(location_id)
            .and_then(|series| series.range(..=at).next_back())
            .map(|(_, temp)| *temp)
            .ok_or_else(|| {
                SourceError::unavailable(location_id, format!("no recorded reading at or before {at}"))
            })
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    #[tokio::test]
    async fn serves_latest_reading_at_or_before() {
        let t0 = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let samples = [
            Sample::new("a".into(), t0, 20.0),
            Sample::new("a".into(), t0 + Duration::minutes(15), 22.0),
        ];
        let source = ReplaySource::from_samples(&samples);
        assert_eq!(source.len(), 2);

        let id = LocationId::from("a");
        assert_eq!(source.fetch(&id, t0).await, Ok(20.0));
        assert_eq!(source.fetch(&id, t0 + Duration::minutes(10)).await, Ok(20.0));
        assert_eq!(source.fetch(&id, t0 + Duration::hours(1)).await, Ok(22.0));
    }

    #[tokio::test]
    async fn before_first_reading_is_unavailable() {
        let t0 = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let mut source = ReplaySource::new();
        source.record("a".into(), t0, 20.0);

        let err = source
            .fetch(&"a".into(), t0 - Duration::seconds(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
        assert!(source.fetch(&"b".into(), t0).await.is_err());
    }
}
