//! Deterministic temperature generator.
//!
//! Produces plausible forest temperatures from coordinates and time of day
//! alone: cooler towards the poles, coolest before dawn and warmest at
//! 14:00 local solar time. Identical inputs always give identical output,
//! which makes it usable both as an offline default and as the fallback for
//! a failing live feed.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Timelike;
use forestwatch_core::location::LocationRegistry;
use forestwatch_core::types::{LocationId, Timestamp};

use super::{ReadingSource, SourceError};

const MIN_CELSIUS: f64 = -10.0;
const MAX_CELSIUS: f64 = 45.0;

/// Solar hour of the daily temperature peak.
const PEAK_HOUR: f64 = 14.0;

pub struct SimulatedSource {
    coordinates: HashMap<LocationId, (f64, f64)>,
}

impl SimulatedSource {
    pub fn new(registry: &LocationRegistry) -> Self {
        let coordinates = registry
            .list_locations()
            .iter()
            .map(|loc| (loc.id.clone(), (loc.latitude, loc.longitude)))
            .collect();
        Self { coordinates }
    }
}

/// Temperature in °C, rounded to one decimal.
pub fn simulated_temperature(latitude: f64, longitude: f64, at: Timestamp) -> f64 {
    let base = 30.0 - latitude.abs() * 0.5;

    let utc_hour = f64::from(at.hour()) + f64::from(at.minute()) / 60.0;
    let solar_hour = (utc_hour + longitude / 15.0).rem_euclid(24.0);
    let time_factor = (solar_hour - PEAK_HOUR).abs() / 12.0;
    let diurnal = -8.0 + 16.0 * (1.0 - time_factor);

    let celsius = (base + diurnal).clamp(MIN_CELSIUS, MAX_CELSIUS);
    (celsius * 10.0).round() / 10.0
}

#[async_trait]
impl ReadingSource for SimulatedSource {
    async fn fetch(&self, location_id: &LocationId, at: Timestamp) -> Result<f64, SourceError> {
        let (lat, lon) = self
            .coordinates
            .get(location_id)
            .copied()
            .ok_or_else(|| SourceError::UnknownLocation(location_id.clone()))?;
        Ok(simulated_temperature(lat, lon, at))
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
