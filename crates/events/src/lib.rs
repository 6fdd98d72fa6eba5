//! Forest monitor event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`MonitorEvent`]: everything the engine announces (ticks, alert level
//!   changes, unavailable locations, configuration and scheduler changes).

pub mod bus;

pub use bus::{EventBus, MonitorEvent};
