//! Engine configuration loaded from environment variables.
//!
//! | Variable                  | Default                          |
//! |---------------------------|----------------------------------|
//! | `REFRESH_INTERVAL_SECS`   | `900`                            |
//! | `NORMAL_FLOOR_C`          | `0`                              |
//! | `WARNING_THRESHOLD_C`     | `30`                             |
//! | `DANGER_THRESHOLD_C`      | `35`                             |
//! | `HISTORY_MAX_SAMPLES`     | `96`                             |
//! | `HISTORY_RETENTION_HOURS` | `24` (`0` disables the age cap)  |
//! | `FETCH_TIMEOUT_SECS`      | `10`                             |
//! | `OPENWEATHER_API_KEY`     | unset (simulated readings only)  |
//! | `OPENWEATHER_BASE_URL`    | `https://api.openweathermap.org` |

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use forestwatch_core::error::CoreError;
use forestwatch_core::history::{RetentionPolicy, DEFAULT_MAX_AGE_HOURS, DEFAULT_MAX_SAMPLES};
use forestwatch_core::location::LocationRegistry;
use forestwatch_core::refresh::{RefreshInterval, DEFAULT_REFRESH_INTERVAL};
use forestwatch_core::thresholds::{
    ThresholdConfig, DEFAULT_DANGER_C, DEFAULT_NORMAL_FLOOR_C, DEFAULT_WARNING_C,
};

use crate::monitor::{MonitorOptions, DEFAULT_FETCH_TIMEOUT};
use crate::source::{
    openweather::DEFAULT_BASE_URL, FallbackSource, OpenWeatherSource, ReadingSource,
    SimulatedSource,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Parse {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("{var}: {source}")]
    Invalid {
        var: &'static str,
        #[source]
        source: CoreError,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Live feed credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenWeatherConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub refresh_interval: RefreshInterval,
    pub thresholds: ThresholdConfig,
    pub retention: RetentionPolicy,
    pub fetch_timeout: Duration,
    pub openweather: Option<OpenWeatherConfig>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval: RefreshInterval::default(),
            thresholds: ThresholdConfig::default(),
            retention: RetentionPolicy::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            openweather: None,
        }
    }
}

impl MonitorConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable lookup. Unset and blank variables
    /// fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let interval_secs = parse_or(
            get("REFRESH_INTERVAL_SECS"),
            "REFRESH_INTERVAL_SECS",
            "a positive number of seconds",
            DEFAULT_REFRESH_INTERVAL.as_secs_f64(),
        )?;
        let refresh_interval = RefreshInterval::from_secs_f64(interval_secs).map_err(|source| {
            ConfigError::Invalid {
                var: "REFRESH_INTERVAL_SECS",
                source,
            }
        })?;

        let normal = parse_or(get("NORMAL_FLOOR_C"), "NORMAL_FLOOR_C", "a number", DEFAULT_NORMAL_FLOOR_C)?;
        let warning = parse_or(
            get("WARNING_THRESHOLD_C"),
            "WARNING_THRESHOLD_C",
            "a number",
            DEFAULT_WARNING_C,
        )?;
        let danger = parse_or(get("DANGER_THRESHOLD_C"), "DANGER_THRESHOLD_C", "a number", DEFAULT_DANGER_C)?;
        let thresholds =
            ThresholdConfig::new(normal, warning, danger).map_err(|source| ConfigError::Invalid {
                var: "WARNING_THRESHOLD_C/DANGER_THRESHOLD_C",
                source,
            })?;

        let max_samples: usize = parse_or(
            get("HISTORY_MAX_SAMPLES"),
            "HISTORY_MAX_SAMPLES",
            "a non-negative integer",
            DEFAULT_MAX_SAMPLES,
        )?;
        let retention_hours: u32 = parse_or(
            get("HISTORY_RETENTION_HOURS"),
            "HISTORY_RETENTION_HOURS",
            "a non-negative integer",
            DEFAULT_MAX_AGE_HOURS as u32,
        )?;
        let max_age = (retention_hours > 0).then(|| chrono::Duration::hours(i64::from(retention_hours)));
        let retention = RetentionPolicy::new(max_samples, max_age).map_err(|source| {
            ConfigError::Invalid {
                var: "HISTORY_MAX_SAMPLES",
                source,
            }
        })?;

        let fetch_timeout_secs: u64 = parse_or(
            get("FETCH_TIMEOUT_SECS"),
            "FETCH_TIMEOUT_SECS",
            "a positive integer",
            DEFAULT_FETCH_TIMEOUT.as_secs(),
        )?;
        if fetch_timeout_secs == 0 {
            return Err(ConfigError::Parse {
                var: "FETCH_TIMEOUT_SECS",
                expected: "a positive integer",
                value: "0".to_string(),
            });
        }

        let openweather = get("OPENWEATHER_API_KEY").map(|api_key| OpenWeatherConfig {
            api_key: api_key.trim().to_string(),
            base_url: get("OPENWEATHER_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        });

        Ok(Self {
            refresh_interval,
            thresholds,
            retention,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            openweather,
        })
    }

    pub fn options(&self) -> MonitorOptions {
        MonitorOptions {
            thresholds: self.thresholds,
            retention: self.retention,
            fetch_timeout: self.fetch_timeout,
        }
    }

    /// How long the live feed gets before the simulated fallback answers.
    /// Half the per-location fetch timeout, so the fallback still fits.
    pub fn primary_timeout(&self) -> Duration {
        self.fetch_timeout / 2
    }

    /// Live feed with simulated fallback when an API key is configured,
    /// otherwise simulated readings only.
    pub fn build_source(
        &self,
        registry: &LocationRegistry,
    ) -> Result<Arc<dyn ReadingSource>, ConfigError> {
        let source: Arc<dyn ReadingSource> = match &self.openweather {
            Some(ow) => {
                let timeout = self.primary_timeout();
                let live = OpenWeatherSource::new(
                    registry,
                    ow.base_url.clone(),
                    ow.api_key.clone(),
                    timeout,
                )
                .map_err(ConfigError::HttpClient)?;
                Arc::new(
                    FallbackSource::new(live, SimulatedSource::new(registry))
                        .with_primary_timeout(timeout),
                )
            }
            None => Arc::new(SimulatedSource::new(registry)),
        };
        Ok(source)
    }
}

fn parse_or<T: FromStr>(
    raw: Option<String>,
    var: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Parse {
            var,
            expected,
            value,
        }),
    }
}
