//! Live readings from the OpenWeatherMap current-weather endpoint.
//!
//! Wraps `GET {base}/data/2.5/weather?lat=..&lon=..&units=metric&appid=..`
//! using [`reqwest`]. The endpoint only reports the present, so `at` is
//! ignored.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use forestwatch_core::location::LocationRegistry;
use forestwatch_core::types::{LocationId, Timestamp};
use serde::Deserialize;

use super::{ReadingSource, SourceError};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// HTTP client for the current-weather endpoint.
pub struct OpenWeatherSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    coordinates: HashMap<LocationId, (f64, f64)>,
}

/// The subset of the response body we read.
#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainReadings,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

impl OpenWeatherSource {
    /// * `base_url` - Scheme and host, e.g. `https://api.openweathermap.org`.
    /// * `request_timeout` - Deadline for each request; a hung server fails
    ///   the fetch instead of stalling it.
    pub fn new(
        registry: &LocationRegistry,
        base_url: String,
        api_key: String,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self::with_client(client, registry, base_url, api_key))
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(
        client: reqwest::Client,
        registry: &LocationRegistry,
        base_url: String,
        api_key: String,
    ) -> Self {
        let coordinates = registry
            .list_locations()
            .iter()
            .map(|loc| (loc.id.clone(), (loc.latitude, loc.longitude)))
            .collect();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            coordinates,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/data/2.5/weather", self.base_url)
    }
}

#[async_trait]
impl ReadingSource for OpenWeatherSource {
    async fn fetch(&self, location_id: &LocationId, _at: Timestamp) -> Result<f64, SourceError> {
        let (lat, lon) = self
            .coordinates
            .get(location_id)
            .copied()
            .ok_or_else(|| SourceError::UnknownLocation(location_id.clone()))?;

        let response = self
            .client
            .get(self.endpoint())
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::unavailable(location_id, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::unavailable(
                location_id,
                format!("weather API returned {status}"),
            ));
        }

        let body: WeatherResponse = response
            .json()
            .await
            .map_err(|e| SourceError::unavailable(location_id, format!("malformed body: {e}")))?;

        tracing::debug!(location_id = %location_id, temp = body.main.temp, "Fetched live reading");
        Ok(body.main.temp)
    }

    fn name(&self) -> &'static str {
        "openweather"
    }
}
