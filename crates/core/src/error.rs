use crate::types::{LocationId, Timestamp};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// A sample did not advance past the newest stored timestamp.
    #[error("Out-of-order sample for {location_id}: {timestamp} is not after {last}")]
    OutOfOrder {
        location_id: LocationId,
        timestamp: Timestamp,
        last: Timestamp,
    },

    #[error("Invalid refresh interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl CoreError {
    /// Shorthand for an unknown location id.
    pub fn location_not_found(id: &LocationId) -> Self {
        Self::NotFound {
            entity: "location",
            id: id.to_string(),
        }
    }
}
