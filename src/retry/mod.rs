//! Retry Module
//!
//! Re-runs failing asynchronous operations with exponential backoff and
//! publishes progress as observable [`RetryState`].
//!
//! Failures never reach the caller as errors: [`RetryExecutor::execute_with_retry`]
//! returns `None` and records a display-ready message in the state.

mod classify;
mod executor;
mod options;
mod state;

use std::time::Duration;

pub use classify::{looks_like_network_failure, Retryable, NETWORK_ERROR_CODE};
pub use executor::RetryExecutor;
pub use options::RetryOptions;
pub use state::{RetryPhase, RetryState};

// == Public Constants ==
/// Retries allowed after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before the first retry; doubles on each subsequent one
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Message shown once every attempt has failed
pub const DEFAULT_EXHAUSTED_MESSAGE: &str =
    "Something went wrong while loading data. Please try again later.";
