use serde::{Deserialize, Serialize};

use crate::types::{LocationId, Timestamp};

/// One timestamped temperature reading for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub location_id: LocationId,
    pub timestamp: Timestamp,
    pub temperature_celsius: f64,
}

impl Sample {
    pub fn new(location_id: LocationId, timestamp: Timestamp, temperature_celsius: f64) -> Self {
        Self {
            location_id,
            timestamp,
            temperature_celsius,
        }
    }
}
