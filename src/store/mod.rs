//! Store Module
//!
//! Asynchronous string key-value stores that back the TTL cache.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::StoreError;

// == Key Value Store ==
/// Durable asynchronous key-value storage shared by the whole process.
///
/// The cache owns key namespacing; a store only ever sees full keys and
/// opaque string values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the raw value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Deletes `key`. Deleting an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Lists every key currently stored, across all owners.
    async fn get_all_keys(&self) -> Result<Vec<String>, StoreError>;

    /// Deletes every key in `keys` in one operation.
    async fn multi_remove(&self, keys: &[String]) -> Result<(), StoreError>;
}
