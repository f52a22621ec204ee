use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::engine::sync::SyncEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub interval: Duration,
    /// Wait used after a cycle that failed as a whole.
    pub backoff: Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            backoff: Duration::from_secs(60),
        }
    }
}

/// Spawn the periodic sync loop. Cancelling `stop` ends it after any in-flight
/// pass has finished; await the handle to wait for that.
pub fn spawn_sync_loop(
    sync: Arc<SyncEngine>,
    cadence: Cadence,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run_sync_loop(sync, cadence, stop))
}

pub async fn run_sync_loop(sync: Arc<SyncEngine>, cadence: Cadence, stop: CancellationToken) {
    info!(
        interval_secs = cadence.interval.as_secs(),
        backoff_secs = cadence.backoff.as_secs(),
        "Background sync started"
    );

    while !stop.is_cancelled() {
        let pass = Arc::clone(&sync);
        let wait = match tokio::task::spawn_blocking(move || pass.sync()).await {
            Ok(Ok(_)) => cadence.interval,
            Ok(Err(e)) => {
                warn!(error = %e, "Background sync pass failed; backing off");
                cadence.backoff
            }
            Err(e) => {
                error!(error = %e, "Background sync task panicked; backing off");
                cadence.backoff
            }
        };

        tokio::select! {
            _ = stop.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }
    }

    info!("Background sync stopped");
}
