//! Cancellable interval driver for the poll cycle.
//!
//! A [`Poller`] is a start/stop handle around one long-lived tokio
//! task looping over a `tokio::time::interval`. The cycle is awaited
//! inside the tick arm, so a slow cycle delays the next tick instead
//! of overlapping it. Stopping cancels future ticks; a cycle already
//! in flight runs to completion.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::reconciler::Reconciler;

/// Handle to a running poll loop.
pub struct Poller {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Poller {
    /// Spawn the poll loop.
    ///
    /// Changing the interval requires [`shutdown`](Poller::shutdown)
    /// followed by a fresh `start`; there is no mid-flight adjustment.
    pub fn start(reconciler: Arc<Reconciler>, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so startup and
            // the first poll are not back to back.
            ticker.tick().await;
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            tracing::info!(interval_secs = interval.as_secs(), "Poller started");

            loop {
                tokio::select! {
                    _ = loop_cancel.cancelled() => {
                        tracing::info!("Poller stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        reconciler.poll_cycle().await;
                    }
                }
            }
        });

        Self { cancel, task }
    }

    /// Stop the loop and wait for it to wind down.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Poll loop task panicked");
        }
    }
}
