//! Periodic refresh driver.
//!
//! [`RefreshScheduler`] owns a single background task that calls
//! [`Monitor::tick`] on a fixed interval. The task is controlled through a
//! `watch` channel (interval and pause flag) and a [`CancellationToken`].
//!
//! State machine:
//!
//! | From    | `start` | `pause` | `resume` | `stop`  |
//! |---------|---------|---------|----------|---------|
//! | Stopped | Running | error   | error    | Stopped |
//! | Running | error   | Paused  | error    | Stopped |
//! | Paused  | Running | error   | Running  | Stopped |
//!
//! Stopping never touches the monitor's history.

use std::sync::Arc;
use std::time::Duration;

use forestwatch_core::refresh::{RefreshInterval, RefreshState, SchedulerState};
use forestwatch_events::MonitorEvent;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::MonitorError;
use crate::monitor::Monitor;
use crate::snapshot::TickReport;

/// How long `stop` waits for the loop task to finish.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Control {
    interval: Duration,
    paused: bool,
}

struct LoopHandle {
    control: watch::Sender<Control>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Inner {
    state: SchedulerState,
    interval: RefreshInterval,
    task: Option<LoopHandle>,
}

pub struct RefreshScheduler {
    monitor: Arc<Monitor>,
    inner: Mutex<Inner>,
}

impl RefreshScheduler {
    /// Create a stopped scheduler.
    pub fn new(monitor: Arc<Monitor>) -> Self {
        Self {
            monitor,
            inner: Mutex::new(Inner {
                state: SchedulerState::Stopped,
                interval: RefreshInterval::default(),
                task: None,
            }),
        }
    }

    pub fn monitor(&self) -> &Arc<Monitor> {
        &self.monitor
    }

    /// Start (or, from Paused, resume) periodic ticks every `interval`.
    ///
    /// From Stopped the first tick runs immediately.
    pub async fn start(&self, interval: Duration) -> Result<(), MonitorError> {
        let interval = RefreshInterval::new(interval)?;
        let mut inner = self.inner.lock().await;

        match inner.state {
            SchedulerState::Running => {
                return Err(MonitorError::InvalidTransition {
                    from: SchedulerState::Running,
                    action: "start",
                })
            }
            SchedulerState::Paused => {
                inner.interval = interval;
                if let Some(task) = &inner.task {
                    task.control.send_replace(Control {
                        interval: interval.as_duration(),
                        paused: false,
                    });
                }
            }
            SchedulerState::Stopped => {
                inner.interval = interval;
                inner.task = Some(self.spawn_loop(interval.as_duration()));
            }
        }

        tracing::info!(interval_secs = interval.as_duration().as_secs_f64(), "Refresh scheduler started");
        self.transition(&mut inner, SchedulerState::Running);
        Ok(())
    }

    /// Suspend ticks. The loop task stays alive.
    pub async fn pause(&self) -> Result<(), MonitorError> {
        let mut inner = self.inner.lock().await;
        if inner.state != SchedulerState::Running {
            return Err(MonitorError::InvalidTransition {
                from: inner.state,
                action: "pause",
            });
        }
        if let Some(task) = &inner.task {
            task.control.send_modify(|c| c.paused = true);
        }
        self.transition(&mut inner, SchedulerState::Paused);
        Ok(())
    }

    /// Continue ticking on the existing schedule. Ticks missed while paused
    /// are not replayed.
    pub async fn resume(&self) -> Result<(), MonitorError> {
        let mut inner = self.inner.lock().await;
        if inner.state != SchedulerState::Paused {
            return Err(MonitorError::InvalidTransition {
                from: inner.state,
                action: "resume",
            });
        }
        if let Some(task) = &inner.task {
            task.control.send_modify(|c| c.paused = false);
        }
        self.transition(&mut inner, SchedulerState::Running);
        Ok(())
    }

    /// Stop the loop task. Valid in every state.
    ///
    /// A tick interrupted by the stop appends nothing.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(task) = inner.task.take() {
            task.cancel.cancel();
            if tokio::time::timeout(STOP_TIMEOUT, task.handle).await.is_err() {
                tracing::warn!("Refresh loop did not exit within the stop timeout");
            }
        }
        if inner.state != SchedulerState::Stopped {
            tracing::info!("Refresh scheduler stopped");
            self.transition(&mut inner, SchedulerState::Stopped);
        }
    }

    /// Change the refresh interval.
    ///
    /// The next tick is rescheduled to one new interval after the previous
    /// tick (or immediately if that moment has passed). History is kept.
    pub async fn set_interval(&self, interval: Duration) -> Result<(), MonitorError> {
        let interval = RefreshInterval::new(interval)?;
        let mut inner = self.inner.lock().await;
        if inner.interval == interval {
            return Ok(());
        }

        inner.interval = interval;
        if let Some(task) = &inner.task {
            task.control
                .send_modify(|c| c.interval = interval.as_duration());
        }

        let interval_secs = interval.as_duration().as_secs_f64();
        tracing::info!(interval_secs, "Refresh interval changed");
        self.monitor
            .publish(MonitorEvent::IntervalChanged { interval_secs });
        Ok(())
    }

    /// Run one tick right away, outside the periodic schedule.
    pub async fn refresh_now(&self) -> Result<TickReport, MonitorError> {
        self.monitor.tick().await
    }

    pub async fn state(&self) -> SchedulerState {
        self.inner.lock().await.state
    }

    pub async fn interval(&self) -> RefreshInterval {
        self.inner.lock().await.interval
    }

    pub async fn refresh_state(&self) -> RefreshState {
        let (state, interval) = {
            let inner = self.inner.lock().await;
            (inner.state, inner.interval)
        };
        RefreshState {
            state,
            interval,
            last_tick: self.monitor.last_ticks().await,
        }
    }

    fn transition(&self, inner: &mut Inner, to: SchedulerState) {
        let from = inner.state;
        inner.state = to;
        if from != to {
            self.monitor
                .publish(MonitorEvent::SchedulerStateChanged { from, to });
        }
    }

    fn spawn_loop(&self, interval: Duration) -> LoopHandle {
        let (control, rx) = watch::channel(Control {
            interval,
            paused: false,
        });
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_refresh_loop(
            Arc::clone(&self.monitor),
            rx,
            cancel.clone(),
        ));

        LoopHandle {
            control,
            cancel,
            handle,
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(task) = &self.inner.get_mut().task {
            task.cancel.cancel();
        }
    }
}

fn ticker(start: Instant, period: Duration) -> Interval {
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Tick loop. Exits when `cancel` fires or the scheduler is dropped.
async fn run_refresh_loop(
    monitor: Arc<Monitor>,
    mut control: watch::Receiver<Control>,
    cancel: CancellationToken,
) {
    let mut period = control.borrow_and_update().interval;
    let mut last_tick = Instant::now();
    let mut ticks = ticker(last_tick, period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Refresh loop cancelled");
                break;
            }
            changed = control.changed() => {
                if changed.is_err() {
                    break;
                }
                let new_period = control.borrow_and_update().interval;
                if new_period != period {
                    period = new_period;
                    let next = (last_tick + period).max(Instant::now());
                    ticks = ticker(next, period);
                }
            }
            tick_at = ticks.tick() => {
                last_tick = tick_at;
                if control.borrow().paused {
                    continue;
                }
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("Refresh loop cancelled during a tick; results discarded");
                        break;
                    }
                    result = monitor.tick() => {
                        if let Err(e) = result {
                            tracing::warn!(error = %e, "Scheduled tick skipped");
                        }
                    }
                }
            }
        }
    }
}
