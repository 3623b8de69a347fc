//! TTL Cleanup Task
//!
//! Background task that periodically removes expired entries from the head of
//! the eviction queue.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::cache::{CacheStore, StatsRecorder};
use crate::error::{CacheError, Result};

// == Cleanup Task ==
/// Owned handle to a running cleaner.
///
/// The task stops when `stop` is called or when this handle is dropped: either
/// way the one-shot receiver resolves and the loop exits, releasing its timer
/// and its reference to the store.
#[derive(Debug)]
pub struct CleanupTask {
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl CleanupTask {
    // == Stop ==
    /// Signals the task to stop. Only the first call sends anything.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Spawns the cleaner on the current tokio runtime.
///
/// Every `interval` the task takes the write lock and calls
/// `CacheStore::remove_expired`. The first sweep runs one interval after
/// spawning.
///
/// # Errors
/// `CacheError::NoRuntime` when called outside a tokio runtime.
///
/// # Example
/// ```ignore
/// let store = Arc::new(RwLock::new(CacheStore::<String>::new(ttl)));
/// let mut cleaner = spawn_cleanup_task(store, stats, Duration::from_secs(1))?;
/// // Later, during shutdown:
/// cleaner.stop();
/// ```
pub fn spawn_cleanup_task<V>(
    store: Arc<RwLock<CacheStore<V>>>,
    stats: Arc<StatsRecorder>,
    interval: Duration,
) -> Result<CleanupTask>
where
    V: Send + Sync + 'static,
{
    let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    runtime.spawn(async move {
        info!(interval = ?interval, "Starting TTL cleanup task");

        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                // Fires on an explicit stop and when the sender is dropped
                _ = &mut shutdown_rx => break,

                _ = ticker.tick() => {
                    let removed = {
                        let mut guard = store.write();
                        guard.remove_expired(Instant::now())
                    };
                    stats.record_sweep(removed);

                    if removed > 0 {
                        debug!(removed, "TTL cleanup: removed expired entries");
                    } else {
                        trace!("TTL cleanup: no expired entries found");
                    }
                }
            }
        }

        info!("TTL cleanup task stopped");
    });

    Ok(CleanupTask {
        shutdown_tx: Some(shutdown_tx),
    })
}
