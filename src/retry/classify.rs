//! Retryability classification
//!
//! An error is retryable only when it points at the network layer: no
//! response arrived, the transport reported a network error code, or the
//! message mentions a network failure or timeout. Anything else (validation,
//! business errors carried in a response) fails the run immediately.

use crate::error::FetchError;

/// Error code some transports attach to connection-level failures.
pub const NETWORK_ERROR_CODE: &str = "NETWORK_ERROR";

const NETWORK_KEYWORDS: &[&str] = &["network", "timeout", "timed out"];

/// Classifies an error as transient (worth retrying) or fatal.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Returns true if `message` reads like a network-layer failure.
pub fn looks_like_network_failure(message: &str) -> bool {
    if message.contains(NETWORK_ERROR_CODE) {
        return true;
    }
    let lower = message.to_lowercase();
    NETWORK_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) => true,
            FetchError::Status { .. } | FetchError::Decode(_) | FetchError::InvalidUrl(_) => false,
        }
    }
}

impl Retryable for reqwest::Error {
    fn is_retryable(&self) -> bool {
        // Any status means the server answered
        if self.status().is_some() {
            return false;
        }
        self.is_timeout()
            || self.is_connect()
            || self.is_request()
            || looks_like_network_failure(&self.to_string())
    }
}

impl Retryable for std::io::Error {
    fn is_retryable(&self) -> bool {
        use std::io::ErrorKind::*;
        matches!(
            self.kind(),
            ConnectionRefused
                | ConnectionReset
                | ConnectionAborted
                | NotConnected
                | BrokenPipe
                | TimedOut
                | Interrupted
                | UnexpectedEof
        )
    }
}

impl Retryable for String {
    fn is_retryable(&self) -> bool {
        looks_like_network_failure(self)
    }
}

impl Retryable for anyhow::Error {
    fn is_retryable(&self) -> bool {
        if let Some(fetch) = self.downcast_ref::<FetchError>() {
            return fetch.is_retryable();
        }
        if let Some(io) = self.downcast_ref::<std::io::Error>() {
            return io.is_retryable();
        }
        looks_like_network_failure(&self.to_string())
    }
}
