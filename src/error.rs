//! Error types for the data layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Store Error Enum ==
/// Failure reported by a backing key-value store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying file or device failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted data could not be decoded
    #[error("Storage data corrupt: {0}")]
    Corrupt(String),

    /// The store refused the operation
    #[error("Storage rejected operation: {0}")]
    Rejected(String),
}

// == Cache Error Enum ==
/// Error type for the TTL cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Entry could not be read or decoded. Recovered locally by read paths.
    #[error("Failed to read cache entry '{key}': {reason}")]
    StorageRead { key: String, reason: String },

    /// Write or delete rejected by the backing store
    #[error("Failed to write cache entry '{key}': {source}")]
    StorageWrite {
        key: String,
        #[source]
        source: StoreError,
    },

    /// Payload could not be serialized
    #[error("Failed to serialize cache entry '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CacheError {
    pub(crate) fn read(key: &str, reason: impl ToString) -> Self {
        CacheError::StorageRead {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(key: &str, source: StoreError) -> Self {
        CacheError::StorageWrite {
            key: key.to_string(),
            source,
        }
    }
}

// == Fetch Error Enum ==
/// Failure while fetching catalog data over HTTP.
#[derive(Error, Debug)]
pub enum FetchError {
    /// No response was received (connection refused, DNS, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// The request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The server answered with a non-success status
    #[error("Server responded with status {status}: {url}")]
    Status { status: u16, url: String },

    /// Response body was not the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Request URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

// == Retry Failure Enum ==
/// Why a retried operation did not produce a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryFailure {
    /// The failure was classified as non-retryable
    #[error("{0}")]
    Fatal(String),

    /// Every allowed attempt failed with a retryable error
    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// The run was reset or superseded while waiting to retry
    #[error("Retry cancelled")]
    Cancelled,
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
