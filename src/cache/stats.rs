//! Cache Statistics Module
//!
//! Tracks cache read outcomes: hits, misses, expirations and corrupt entries.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of reads that returned data
    pub hits: u64,
    /// Number of reads that found nothing usable (absent, expired or corrupt)
    pub misses: u64,
    /// Number of entries dropped because their TTL had elapsed
    pub expirations: u64,
    /// Number of reads that found an undecodable entry
    pub corrupt_reads: u64,
    /// Number of successful writes
    pub writes: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Records a cache hit.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Records a cache miss.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Expiration ==
    /// Counts an expired read; expirations are also misses.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
        self.misses += 1;
    }

    // == Record Corrupt ==
    /// Counts a corrupt read; corrupt reads are also misses.
    pub fn record_corrupt(&mut self) {
        self.corrupt_reads += 1;
        self.misses += 1;
    }

    // == Record Write ==
    /// Records a successful write.
    pub fn record_write(&mut self) {
        self.writes += 1;
    }
}
