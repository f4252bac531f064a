//! Background removal of expired verification records

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::service::VerificationService;
use super::traits::VerificationStore;

/// Periodically calls [`VerificationService::sweep_expired`]
pub struct ExpirySweeper;

impl ExpirySweeper {
    /// Start sweeping every `interval`. The first sweep happens one full
    /// interval after start. Dropping the returned handle also stops the task.
    pub fn spawn<S>(service: Arc<VerificationService<S>>, interval: Duration) -> SweeperHandle
    where
        S: VerificationStore + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

        let task = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "Expiry sweeper started");

            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = service.sweep_expired().await {
                            error!(error = %e, event = "sweep_failed", "Expiry sweep failed");
                        }
                    }
                }
            }

            info!("Expiry sweeper stopped");
        });

        SweeperHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Owner of a running sweeper task
pub struct SweeperHandle {
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper and wait for it to exit
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
