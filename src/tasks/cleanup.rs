//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired cache entries, so
//! entries nobody reads again do not stay on disk indefinitely.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheService, Clock};
use crate::store::KeyValueStore;

/// Spawns a background task that periodically removes expired cache entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between sweeps.
/// A failed sweep is logged and retried on the next tick.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(CacheService::new(store, CacheOptions::default()));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<S, C>(cache: Arc<CacheService<S, C>>, interval: Duration) -> JoinHandle<()>
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    tokio::spawn(async move {
        info!("Starting TTL cleanup task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            match cache.cleanup_expired().await {
                Ok(0) => debug!("TTL cleanup: no expired entries found"),
                Ok(removed) => info!("TTL cleanup: removed {} expired entries", removed),
                Err(e) => warn!("TTL cleanup failed: {}", e),
            }
        }
    })
}
