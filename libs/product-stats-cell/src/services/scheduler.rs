use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::services::refresh::RefreshCoordinator;

const MIN_TICK: Duration = Duration::from_secs(1);

/// Proactively recomputes the snapshot before it expires so readers rarely
/// hit a blocking refresh.
pub struct BackgroundRefresher {
    coordinator: Arc<RefreshCoordinator>,
    retry_interval: Duration,
}

impl BackgroundRefresher {
    pub fn new(coordinator: Arc<RefreshCoordinator>) -> Self {
        let retry_interval = coordinator.retry_after_failure();
        Self {
            coordinator,
            retry_interval,
        }
    }

    /// Runs until `shutdown` flips to `true` or its sender is dropped.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Background stats refresher started");

        loop {
            let wait = match self.coordinator.refresh_if_due().await {
                Ok(entry) => entry.next_update_in(Instant::now()).max(MIN_TICK),
                Err(e) => {
                    warn!(
                        "Background stats refresh failed, retrying in {}s: {}",
                        self.retry_interval.as_secs(),
                        e
                    );
                    self.retry_interval.max(MIN_TICK)
                }
            };

            info!("Next stats refresh scheduled in {}s", wait.as_secs());

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Background stats refresher stopped");
    }
}
