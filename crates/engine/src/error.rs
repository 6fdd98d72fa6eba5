use forestwatch_core::error::CoreError;
use forestwatch_core::refresh::SchedulerState;

/// Errors surfaced by the monitor facade and the refresh scheduler.
///
/// Fetch failures never appear here: they are isolated per location inside
/// a tick and reported through [`TickReport`](crate::snapshot::TickReport).
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Validation, lookup and ordering errors from the domain layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The requested scheduler operation is not valid in the current state.
    #[error("Cannot {action} while scheduler is {from}")]
    InvalidTransition {
        from: SchedulerState,
        action: &'static str,
    },

    /// Another tick is still running on this monitor.
    #[error("A tick is already in progress")]
    TickInProgress,
}

impl MonitorError {
    /// The wrapped domain error, if any.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(e) => Some(e),
            _ => None,
        }
    }
}
