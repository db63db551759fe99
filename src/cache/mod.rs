//! Cache Module
//!
//! Provides a persistent, namespaced cache with lazy TTL expiration.

mod clock;
mod entry;
mod service;
mod stats;


use std::time::Duration;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use service::{CacheOptions, CacheService};
pub use stats::CacheStats;

// == Public Constants ==
/// Namespace prefix for every key owned by the cache
pub const DEFAULT_PREFIX: &str = "@cache_";

/// TTL applied when none is given (30 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_millis(1_800_000);
