//! Async timer driver.
//!
//! A single tokio task owns the [`TimerController`]. UI commands reach it
//! over an `mpsc` channel and every state change is published on a `watch`
//! channel. The tick interval exists only while the session is running:
//! it is created when the clock starts and dropped when it stops, so no
//! tick can fire after a pause, a reset or shutdown has been handled.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::TimerError;
use crate::recipe::loader::env_or;

use super::controller::{TimerController, TimerSnapshot};

/// `tokio::time::interval` rejects a zero period.
const MIN_TICK: Duration = Duration::from_millis(1);

// ============================================================================
// Configuration
// ============================================================================

/// Driver settings.
#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// Wall-clock length of one timer second.
    pub tick_interval: Duration,
    /// Queued commands before senders wait.
    pub channel_capacity: usize,
}

impl Default for TimerConfig {
    fn default() -> Self {
        let tick: humantime::Duration = env_or("BREWTIMER_TICK", Duration::from_secs(1).into());
        Self {
            tick_interval: tick.into(),
            channel_capacity: env_or("BREWTIMER_COMMAND_CAPACITY", 32),
        }
    }
}

// ============================================================================
// Commands & Handle
// ============================================================================

/// Requests the driver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Start, pause or resume.
    Toggle,
    /// Back to idle at 0 seconds.
    Reset,
    /// Jump to the previous step.
    PreviousStep,
    /// Jump to the next step.
    NextStep,
    /// Only report the current state.
    Snapshot,
}

type Request = (TimerCommand, oneshot::Sender<TimerSnapshot>);

/// Cloneable handle to a running timer task.
///
/// Dropping every handle also stops the task.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    commands: mpsc::Sender<Request>,
    snapshots: watch::Receiver<TimerSnapshot>,
    cancel: CancellationToken,
}

impl TimerHandle {
    /// Starts, pauses or resumes the clock.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::SessionClosed` if the task has stopped.
    pub async fn toggle(&self) -> Result<TimerSnapshot, TimerError> {
        self.send(TimerCommand::Toggle).await
    }

    /// Resets the session.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::SessionClosed` if the task has stopped.
    pub async fn reset(&self) -> Result<TimerSnapshot, TimerError> {
        self.send(TimerCommand::Reset).await
    }

    /// Jumps to the previous step (no-op on the first).
    ///
    /// # Errors
    ///
    /// Returns `TimerError::SessionClosed` if the task has stopped.
    pub async fn previous_step(&self) -> Result<TimerSnapshot, TimerError> {
        self.send(TimerCommand::PreviousStep).await
    }

    /// Jumps to the next step (no-op on the last).
    ///
    /// # Errors
    ///
    /// Returns `TimerError::SessionClosed` if the task has stopped.
    pub async fn next_step(&self) -> Result<TimerSnapshot, TimerError> {
        self.send(TimerCommand::NextStep).await
    }

    /// Current state, as seen by the task.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::SessionClosed` if the task has stopped.
    pub async fn snapshot(&self) -> Result<TimerSnapshot, TimerError> {
        self.send(TimerCommand::Snapshot).await
    }

    /// Sends any command and waits for the resulting state.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::SessionClosed` if the task has stopped.
    pub async fn send(&self, command: TimerCommand) -> Result<TimerSnapshot, TimerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send((command, reply_tx))
            .await
            .map_err(|_| TimerError::SessionClosed)?;
        reply_rx.await.map_err(|_| TimerError::SessionClosed)
    }

    /// Receiver that sees every published state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshots.clone()
    }

    /// Most recently published state, without a round trip.
    #[must_use]
    pub fn latest(&self) -> TimerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Stops the task. Pending and later commands fail with `SessionClosed`.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ============================================================================
// Task
// ============================================================================

/// Spawns the timer task.
///
/// The task returns the final snapshot when it stops, either through
/// [`TimerHandle::shutdown`] or because every handle was dropped.
#[must_use]
pub fn spawn(
    controller: TimerController,
    config: &TimerConfig,
) -> (TimerHandle, JoinHandle<TimerSnapshot>) {
    let (commands_tx, commands_rx) = mpsc::channel(config.channel_capacity.max(1));
    let (snapshots_tx, snapshots_rx) = watch::channel(controller.snapshot());
    let cancel = CancellationToken::new();

    let driver = Driver {
        controller,
        period: config.tick_interval.max(MIN_TICK),
        ticker: None,
        commands: commands_rx,
        snapshots: snapshots_tx,
        cancel: cancel.clone(),
    };
    let task = tokio::spawn(driver.run());

    let handle = TimerHandle {
        commands: commands_tx,
        snapshots: snapshots_rx,
        cancel,
    };
    (handle, task)
}

struct Driver {
    controller: TimerController,
    period: Duration,
    ticker: Option<Interval>,
    commands: mpsc::Receiver<Request>,
    snapshots: watch::Sender<TimerSnapshot>,
    cancel: CancellationToken,
}

impl Driver {
    async fn run(mut self) -> TimerSnapshot {
        self.sync_ticker();
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    debug!("timer task cancelled");
                    break;
                }
                request = self.commands.recv() => {
                    let Some((command, reply)) = request else {
                        debug!("all timer handles dropped");
                        break;
                    };
                    self.apply(command);
                    let snapshot = self.publish();
                    let _ = reply.send(snapshot);
                }
                () = next_tick(&mut self.ticker) => {
                    if let Some(outcome) = self.controller.tick() {
                        trace!(elapsed = outcome.elapsed_seconds, step_index = outcome.step_index, "tick");
                    }
                    self.publish();
                }
            }
        }
        self.ticker = None;
        self.controller.snapshot()
    }

    fn apply(&mut self, command: TimerCommand) {
        match command {
            TimerCommand::Toggle => {
                self.controller.toggle();
            }
            TimerCommand::Reset => self.controller.reset(),
            TimerCommand::PreviousStep => {
                self.controller.go_to_previous_step();
            }
            TimerCommand::NextStep => {
                self.controller.go_to_next_step();
            }
            TimerCommand::Snapshot => {}
        }
        self.sync_ticker();
    }

    /// Arms a fresh interval on entering Running and drops it on leaving.
    ///
    /// The first tick of a fresh interval is one full period away, so a
    /// partially elapsed second before a pause is discarded.
    fn sync_ticker(&mut self) {
        match (self.controller.is_running(), self.ticker.is_some()) {
            (true, false) => {
                let mut interval =
                    tokio::time::interval_at(Instant::now() + self.period, self.period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ticker = Some(interval);
            }
            (false, true) => self.ticker = None,
            _ => {}
        }
    }

    fn publish(&self) -> TimerSnapshot {
        let snapshot = self.controller.snapshot();
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::notify::{NoAlert, NotificationSink, RecordingSink};
    use crate::recipe::Recipe;
    use crate::timer::TimerStatus;

    fn start(config: &TimerConfig) -> (TimerHandle, JoinHandle<TimerSnapshot>, Arc<RecordingSink>) {
        let recipe = Arc::new(Recipe::from_steps(
            "v60",
            "V60",
            &[("Bloom", 45, 70), ("Pour", 45, 50), ("Drain", 45, 60)],
        ));
        let recorder = Arc::new(RecordingSink::new());
        let controller = TimerController::new(
            recipe,
            Arc::clone(&recorder) as Arc<dyn NotificationSink>,
            Arc::new(NoAlert),
        )
        .unwrap();
        let (handle, task) = spawn(controller, config);
        (handle, task, recorder)
    }

    fn one_second() -> TimerConfig {
        TimerConfig {
            tick_interval: Duration::from_secs(1),
            channel_capacity: 8,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_only_while_running() {
        let (handle, task, _) = start(&one_second());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.snapshot().await.unwrap().elapsed_seconds, 0);

        handle.toggle().await.unwrap();
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let snap = handle.toggle().await.unwrap();
        assert_eq!(snap.elapsed_seconds, 3);
        assert_eq!(snap.status, TimerStatus::Paused);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.snapshot().await.unwrap().elapsed_seconds, 3);

        handle.shutdown();
        let last = task.await.unwrap();
        assert_eq!(last.elapsed_seconds, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn watch_sees_published_state() {
        let (handle, _task, _) = start(&one_second());
        let mut rx = handle.subscribe();
        handle.toggle().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().elapsed_seconds, 1);
        assert_eq!(handle.latest().elapsed_seconds, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_stops_the_clock() {
        let (handle, _task, recorder) = start(&one_second());
        handle.toggle().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        let snap = handle.reset().await.unwrap();
        assert_eq!(snap.elapsed_seconds, 0);
        assert_eq!(snap.status, TimerStatus::Idle);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.snapshot().await.unwrap().elapsed_seconds, 0);
        assert_eq!(recorder.kinds(), vec!["recipe_started"]);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_fail_after_shutdown() {
        let (handle, task, _) = start(&one_second());
        handle.shutdown();
        task.await.unwrap();
        assert_eq!(handle.toggle().await, Err(TimerError::SessionClosed));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handles_stops_task() {
        let (handle, task, _) = start(&one_second());
        drop(handle);
        let last = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("task should stop once handles are gone")
            .unwrap();
        assert_eq!(last.status, TimerStatus::Idle);
    }

    #[test]
    fn default_config_is_one_second() {
        let config = TimerConfig::default();
        assert!(config.channel_capacity > 0);
        assert!(!config.tick_interval.is_zero());
    }
}
