//! Recurring background tasks with explicit start and stop

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Emits an event into the pipeline channel every `period` until stopped.
/// The first event fires one period after start.
pub struct RecurringTask {
    name: String,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RecurringTask {
    pub fn start<E, F>(name: &str, period: Duration, tx: mpsc::Sender<E>, make_event: F) -> Self
    where
        E: Send + 'static,
        F: Fn() -> E + Send + 'static,
    {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let task_name = name.to_string();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if tx.send(make_event()).await.is_err() {
                            debug!(task = %task_name, "Receiver gone, stopping");
                            break;
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        });

        Self {
            name: name.to_string(),
            shutdown,
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signals the task and waits for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
        debug!(task = %self.name, "Recurring task stopped");
    }
}
