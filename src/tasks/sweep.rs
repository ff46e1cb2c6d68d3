//! Expiry Sweep Task
//!
//! Background task that periodically purges expired entries from every
//! registered cache. Lookups already treat stale entries as absent; the sweep
//! only releases their memory early.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheRegistry;

/// Spawns a background task that purges expired entries every `interval_secs`.
///
/// The returned handle should be aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let registry = CacheRegistry::new();
/// let sweep_handle = spawn_sweep_task(registry.clone(), 30);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(registry: CacheRegistry, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = registry.purge_expired();
            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
