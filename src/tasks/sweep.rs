//! Expiry Sweep Task
//!
//! Background task that periodically removes expired documents from the cache.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::SharedDocumentCache;

/// Spawns a task that purges expired documents every `interval`.
///
/// The first sweep runs one full interval after spawning. The returned handle
/// is aborted on shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(DocumentCache::default()));
/// let sweep = spawn_sweep_task(cache.clone(), Duration::from_secs(300));
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_sweep_task(cache: SharedDocumentCache, interval: Duration) -> JoinHandle<()> {
    // tokio intervals reject a zero period
    let interval = interval.max(Duration::from_millis(1));

    tokio::spawn(async move {
        info!("Starting expiry sweep task with interval of {:?}", interval);

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.purge_expired()
            };

            if removed > 0 {
                info!("Expiry sweep: removed {} expired documents", removed);
            } else {
                debug!("Expiry sweep: no expired documents found");
            }
        }
    })
}
