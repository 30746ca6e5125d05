//! Expiry Sweep Task
//!
//! Reads already evict expired entries lazily; this task bounds how long
//! an entry nobody reads can keep occupying the store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically removes expired entries.
///
/// Returns `None` when `interval` is zero, which disables the sweep.
/// The handle can be aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(CacheStore::new(1000)));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// if let Some(handle) = cleanup_handle {
///     handle.abort();
/// }
/// ```
pub fn spawn_cleanup_task(
    cache: Arc<RwLock<CacheStore>>,
    interval: Duration,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        info!("Expiry sweep disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting expiry sweep");

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.cleanup_expired()
            };

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    }))
}
