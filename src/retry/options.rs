//! Per-call retry configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::{Retryable, DEFAULT_BASE_DELAY, DEFAULT_EXHAUSTED_MESSAGE, DEFAULT_MAX_RETRIES};

type Predicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

// == Retry Options ==
/// Backoff parameters and retryability predicate for one run.
pub struct RetryOptions<E> {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Error recorded once all attempts are used up
    pub exhausted_message: String,
    should_retry: Predicate<E>,
}

impl<E: Retryable + 'static> Default for RetryOptions<E> {
    fn default() -> Self {
        Self::with_predicate(|e: &E| e.is_retryable())
    }
}

impl<E> RetryOptions<E> {
    // == Constructor ==
    /// Default backoff using `should_retry` to classify errors.
    ///
    /// For error types that implement [`Retryable`], prefer `default()`.
    pub fn with_predicate(should_retry: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            exhausted_message: DEFAULT_EXHAUSTED_MESSAGE.to_string(),
            should_retry: Arc::new(should_retry),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_exhausted_message(mut self, message: impl Into<String>) -> Self {
        self.exhausted_message = message.into();
        self
    }

    /// Replaces the retryability predicate.
    pub fn with_should_retry(
        mut self,
        should_retry: impl Fn(&E) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_retry = Arc::new(should_retry);
        self
    }

    pub fn should_retry(&self, error: &E) -> bool {
        (self.should_retry)(error)
    }

    // == Backoff ==
    /// Delay to wait after the failed attempt `attempt` (0-indexed):
    /// `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl<E> Clone for RetryOptions<E> {
    fn clone(&self) -> Self {
        Self {
            max_retries: self.max_retries,
            base_delay: self.base_delay,
            exhausted_message: self.exhausted_message.clone(),
            should_retry: self.should_retry.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("exhausted_message", &self.exhausted_message)
            .finish_non_exhaustive()
    }
}
