//! Pure domain logic for the forest temperature monitor.
//!
//! Nothing in this crate performs I/O or spawns tasks. The engine crate
//! composes these pieces behind locks and drives them from a scheduler.

pub mod alert;
pub mod error;
pub mod history;
pub mod location;
pub mod refresh;
pub mod sample;
pub mod thresholds;
pub mod types;

pub use alert::{classify, AlertLevel};
pub use error::CoreError;
pub use history::{History, HistoryBuffer, RetentionPolicy};
pub use location::{Location, LocationRegistry};
pub use refresh::{RefreshInterval, RefreshState, SchedulerState};
pub use sample::Sample;
pub use thresholds::{ThresholdBounds, ThresholdConfig, ThresholdSet};
pub use types::{LocationId, Timestamp};
