//! Fixed-period tick source.
//!
//! The scheduler never touches engine state. It only posts [`Tick`] into a
//! channel that the session loop drains alongside inbound frames and input
//! events, so all mutation stays on one task.

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod scheduler_test;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// One scheduler period elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

/// Owns the spawned interval task. Dropping it cancels the task.
#[derive(Debug, Default)]
pub struct TickScheduler {
    handle: Option<JoinHandle<()>>,
}

impl TickScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a [`Tick`] to `tx` every `period`, replacing any running task.
    /// The first tick arrives one full period after the call. Stops on its
    /// own when the receiver is dropped.
    pub fn start(&mut self, period: Duration, tx: mpsc::Sender<Tick>) {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(Tick).await.is_err() {
                    break;
                }
            }
        }));
    }

    /// Stop the running task, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
