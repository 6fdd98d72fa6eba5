//! Forest temperature monitoring engine.
//!
//! Composes the pure domain types from `forestwatch-core` into a running
//! system: reading sources fetch temperatures, the [`Monitor`] records them
//! and answers queries, and the [`RefreshScheduler`] drives periodic ticks.

pub mod clock;
pub mod config;
pub mod error;
pub mod monitor;
pub mod scheduler;
pub mod snapshot;
pub mod source;

pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock};
pub use config::{ConfigError, MonitorConfig};
pub use error::MonitorError;
pub use monitor::{Monitor, MonitorOptions};
pub use scheduler::RefreshScheduler;
pub use snapshot::{AlertSummary, FetchHealth, Playback, Snapshot, SnapshotEntry, TickReport, Timeline};
pub use source::{ReadingSource, SourceError};
