//! Cache Service Module
//!
//! Namespaced TTL cache over a shared [`KeyValueStore`]. Expiry is lazy:
//! entries are only checked, and dropped, when they are read or swept.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, Clock, SystemClock, DEFAULT_PREFIX, DEFAULT_TTL};
use crate::error::{CacheError, Result};
use crate::store::KeyValueStore;

// == Cache Options ==
/// Construction parameters for [`CacheService`].
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Prefix prepended to every key this cache owns
    pub prefix: String,
    /// TTL applied when `set` is called without one
    pub default_ttl: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            default_ttl: DEFAULT_TTL,
        }
    }
}

// == Cache Service ==
/// TTL cache storing JSON-encoded [`CacheEntry`] envelopes.
///
/// Construct one per process and share it through an `Arc`. The underlying
/// store may hold keys belonging to other owners; this service only ever
/// touches keys under its own prefix.
pub struct CacheService<S, C = SystemClock> {
    store: Arc<S>,
    clock: C,
    prefix: String,
    default_ttl: Duration,
    stats: Mutex<CacheStats>,
}

impl<S: KeyValueStore> CacheService<S, SystemClock> {
    // == Constructor ==
    /// Creates a cache over `store` using wall-clock time.
    pub fn new(store: Arc<S>, options: CacheOptions) -> Self {
        Self::with_clock(store, options, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> CacheService<S, C> {
    /// Creates a cache over `store` using `clock` for timestamps.
    pub fn with_clock(store: Arc<S>, options: CacheOptions, clock: C) -> Self {
        Self {
            store,
            clock,
            prefix: options.prefix,
            default_ttl: options.default_ttl,
            stats: Mutex::new(CacheStats::new()),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    // == Set ==
    /// Stores `data` under `key`, replacing any existing entry.
    ///
    /// # Arguments
    /// * `key` - Logical key, without the namespace prefix
    /// * `data` - Any serializable payload
    /// * `ttl` - Lifetime of the entry (uses the default TTL if None)
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        data: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        // Saturate so oversized TTLs never wrap into the past
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let entry = CacheEntry::new(data, self.clock.now_ms(), ttl_ms);

        let raw = serde_json::to_string(&entry).map_err(|source| CacheError::Serialization {
            key: key.to_string(),
            source,
        })?;

        self.store
            .set(&self.storage_key(key), raw)
            .await
            .map_err(|e| CacheError::write(key, e))?;

        self.stats.lock().record_write();
        debug!("Cached '{}' for {:?}", key, ttl);
        Ok(())
    }

    // == Lookup ==
    /// Reads the raw entry for `key` without checking expiry.
    ///
    /// Distinguishes an absent entry (`Ok(None)`) from one that exists but
    /// cannot be read or decoded (`Err(CacheError::StorageRead)`).
    pub async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CacheEntry<T>>> {
        let raw = self
            .store
            .get(&self.storage_key(key))
            .await
            .map_err(|e| CacheError::read(key, e))?;

        match raw {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| CacheError::read(key, e)),
        }
    }

    // == Get ==
    /// Returns the cached value for `key` if present and not expired.
    ///
    /// An expired entry is deleted as a side effect. A corrupted or
    /// unreadable entry is logged and reported as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = match self.lookup::<T>(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                self.stats.lock().record_miss();
                debug!("Cache miss for '{}'", key);
                return None;
            }
            Err(e) => {
                self.stats.lock().record_corrupt();
                warn!("{}", e);
                return None;
            }
        };

        let now = self.clock.now_ms();
        if entry.is_expired_at(now) {
            self.stats.lock().record_expiration();
            debug!("Cache entry '{}' expired", key);
            if self.still_stale(key, now).await {
                if let Err(e) = self.remove(key).await {
                    warn!("Failed to drop expired entry: {}", e);
                }
            }
            return None;
        }

        self.stats.lock().record_hit();
        Some(entry.data)
    }

    // == Remove ==
    /// Deletes the entry for `key`. Removing an absent key succeeds.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.store
            .remove(&self.storage_key(key))
            .await
            .map_err(|e| CacheError::write(key, e))
    }

    // == Clear ==
    /// Deletes every entry under this cache's prefix, leaving other keys intact.
    pub async fn clear(&self) -> Result<()> {
        let keys = self.owned_storage_keys().await?;
        if keys.is_empty() {
            return Ok(());
        }

        self.store
            .multi_remove(&keys)
            .await
            .map_err(|e| CacheError::write(&self.prefix, e))?;

        debug!("Cleared {} cache entries", keys.len());
        Ok(())
    }

    // == Cache Age ==
    /// Milliseconds since the entry for `key` was written, or None if absent
    /// or unreadable.
    pub async fn get_cache_age(&self, key: &str) -> Option<i64> {
        match self.lookup::<IgnoredAny>(key).await {
            Ok(entry) => entry.map(|e| e.age_at(self.clock.now_ms())),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    // == Is Valid ==
    /// Returns true if an entry for `key` exists and has not expired.
    pub async fn is_valid(&self, key: &str) -> bool {
        match self.lookup::<IgnoredAny>(key).await {
            Ok(Some(entry)) => !entry.is_expired_at(self.clock.now_ms()),
            Ok(None) => false,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    // == Keys ==
    /// Logical keys (prefix stripped) currently stored, expired ones included.
    pub async fn keys(&self) -> Result<Vec<String>> {
        Ok(self
            .owned_storage_keys()
            .await?
            .into_iter()
            .filter_map(|k| k.strip_prefix(&self.prefix).map(str::to_string))
            .collect())
    }

    // == Cleanup Expired ==
    /// Removes all expired or undecodable entries under this cache's prefix.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> Result<usize> {
        let now = self.clock.now_ms();
        let mut candidates = Vec::new();

        for key in self.keys().await? {
            let is_stale = match self.lookup::<IgnoredAny>(&key).await {
                Ok(Some(entry)) => entry.is_expired_at(now),
                Ok(None) => false,
                Err(e) => {
                    warn!("Sweeping corrupt entry: {}", e);
                    true
                }
            };
            if is_stale {
                candidates.push(key);
            }
        }

        // Entries rewritten since the scan are kept
        let mut stale = Vec::new();
        for key in candidates {
            if self.still_stale(&key, now).await {
                stale.push(self.storage_key(&key));
            }
        }

        if !stale.is_empty() {
            self.store
                .multi_remove(&stale)
                .await
                .map_err(|e| CacheError::write(&self.prefix, e))?;
        }

        Ok(stale.len())
    }

    // == Stats ==
    /// Returns a snapshot of the read/write counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    /// Re-reads `key` just before a delete; true if it is still expired or
    /// undecodable.
    ///
    /// The store has no compare-and-delete, so a `set` landing between this
    /// check and the removal is still lost. That window is one store call wide.
    async fn still_stale(&self, key: &str, now: i64) -> bool {
        match self.lookup::<IgnoredAny>(key).await {
            Ok(Some(entry)) => entry.is_expired_at(now),
            Ok(None) => false,
            Err(_) => true,
        }
    }

    async fn owned_storage_keys(&self) -> Result<Vec<String>> {
        let keys = self
            .store
            .get_all_keys()
            .await
            .map_err(|e| CacheError::read(&self.prefix, e))?;

        Ok(keys
            .into_iter()
            .filter(|k| k.starts_with(&self.prefix))
            .collect())
    }
}
