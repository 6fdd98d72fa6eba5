//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans out every [`MonitorEvent`] to all current subscribers.
//! It is owned by the monitor and shared by reference; presentation code
//! obtains receivers through the monitor's `subscribe` method.

use forestwatch_core::alert::AlertLevel;
use forestwatch_core::refresh::SchedulerState;
use forestwatch_core::thresholds::ThresholdConfig;
use forestwatch_core::types::{LocationId, Timestamp};
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// MonitorEvent
// ---------------------------------------------------------------------------

/// Something that happened inside the monitoring engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// A tick finished its append phase.
    TickCompleted {
        at: Timestamp,
        recorded: usize,
        failed: usize,
    },

    /// A location could not be sampled during a tick.
    LocationUnavailable {
        location_id: LocationId,
        at: Timestamp,
        reason: String,
    },

    /// A location's latest reading moved into a different alert band.
    AlertLevelChanged {
        location_id: LocationId,
        /// `None` for the first sample ever recorded.
        from: Option<AlertLevel>,
        to: AlertLevel,
        temperature_celsius: f64,
        at: Timestamp,
    },

    /// Global thresholds (`location_id: None`) or an override were replaced.
    ThresholdsUpdated {
        location_id: Option<LocationId>,
        thresholds: Option<ThresholdConfig>,
    },

    /// The refresh interval changed; value in seconds.
    IntervalChanged { interval_secs: f64 },

    SchedulerStateChanged {
        from: SchedulerState,
        to: SchedulerState,
    },
}

impl MonitorEvent {
    /// Dot-separated event name, e.g. `"alert.level_changed"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TickCompleted { .. } => "tick.completed",
            Self::LocationUnavailable { .. } => "location.unavailable",
            Self::AlertLevelChanged { .. } => "alert.level_changed",
            Self::ThresholdsUpdated { .. } => "thresholds.updated",
            Self::IntervalChanged { .. } => "scheduler.interval_changed",
            Self::SchedulerStateChanged { .. } => "scheduler.state_changed",
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// ```rust
/// use forestwatch_events::bus::{EventBus, MonitorEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(MonitorEvent::IntervalChanged { interval_secs: 300.0 });
/// ```
pub struct EventBus {
    sender: broadcast::Sender<MonitorEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: MonitorEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
