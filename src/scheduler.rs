use crate::sync::SyncService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Handle for requesting an out-of-schedule refresh.
#[derive(Debug, Clone)]
pub struct RefreshTrigger {
    tx: mpsc::Sender<()>,
}

impl RefreshTrigger {
    /// Queues a refresh. Returns false when one is already pending; the two coalesce.
    pub fn request(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

/// Spawns the periodic updater. The first scheduled pass runs one `interval` from now.
pub fn spawn_refresh_loop(
    service: Arc<SyncService>,
    interval: Duration,
) -> (RefreshTrigger, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<()>(1);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    info!("Scheduled filter list update...");
                }
                received = rx.recv() => {
                    if received.is_none() {
                        break;
                    }
                    info!("Forced filter list update triggered...");
                    ticker.reset();
                }
            }

            if let Err(e) = service.refresh().await {
                error!("Scheduled refresh failed: {}", e);
            }
        }
    });

    (RefreshTrigger { tx }, handle)
}
