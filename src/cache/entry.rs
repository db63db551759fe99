//! Cache Entry Module
//!
//! Defines the persisted envelope for individual cache entries with TTL support.

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A cached payload together with its creation and expiry instants.
///
/// Entries are replaced wholesale on refresh; `expiry` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached payload, opaque to the cache
    pub data: T,
    /// Creation timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Absolute expiration timestamp (Unix milliseconds)
    pub expiry: i64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new entry stamped at `now` that expires `ttl_ms` later.
    pub fn new(data: T, now: i64, ttl_ms: i64) -> Self {
        Self {
            data,
            timestamp: now,
            expiry: now.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is still valid at exactly `now == expiry`
    /// and expired only once the current time is strictly past it.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.expiry
    }

    // == Age ==
    /// Milliseconds elapsed since the entry was written.
    pub fn age_at(&self, now: i64) -> i64 {
        now - self.timestamp
    }

    /// Remaining lifetime in milliseconds, `0` once expired.
    pub fn ttl_remaining_at(&self, now: i64) -> i64 {
        (self.expiry - now).max(0)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("payload".to_string(), 1_000, 500);

        assert_eq!(entry.data, "payload");
        assert_eq!(entry.timestamp, 1_000);
        assert_eq!(entry.expiry, 1_500);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new(1u8, 1_000, 500);

        assert!(!entry.is_expired_at(1_499));
        assert!(!entry.is_expired_at(1_500), "Entry is valid at exact expiry");
        assert!(entry.is_expired_at(1_501));
    }

    #[test]
    fn test_zero_ttl_valid_only_at_creation_instant() {
        let entry = CacheEntry::new(1u8, 42, 0);
        assert!(!entry.is_expired_at(42));
        assert!(entry.is_expired_at(43));
    }

    #[test]
    fn test_age_and_remaining() {
        let entry = CacheEntry::new((), 10_000, 3_000);

        assert_eq!(entry.age_at(10_000), 0);
        assert_eq!(entry.age_at(12_500), 2_500);
        assert_eq!(entry.ttl_remaining_at(12_500), 500);
        assert_eq!(entry.ttl_remaining_at(20_000), 0);
    }

    #[test]
    fn test_entry_wire_format() {
        let entry = CacheEntry::new(vec![1, 2], 5, 10);
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"data": [1, 2], "timestamp": 5, "expiry": 15})
        );
    }
}
