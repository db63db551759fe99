//! Shop Cache - data layer for a shopping catalog
//!
//! Provides a persistent TTL cache and retry-with-backoff fetching, composed
//! into a cache-first catalog repository.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod retry;
pub mod store;
pub mod tasks;

pub use cache::{CacheOptions, CacheService};
pub use config::Config;
pub use retry::{RetryExecutor, RetryOptions, RetryState};
pub use tasks::spawn_cleanup_task;
