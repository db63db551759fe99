//! Retry Executor
//!
//! Runs an async operation until it succeeds, fails fatally, or exhausts its
//! retries, publishing a [`RetryState`] after every attempt.

use std::fmt::Display;
use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{RetryOptions, RetryState};
use crate::error::RetryFailure;

/// Identifies the current run; bumped on every start and reset.
#[derive(Debug)]
struct RunControl {
    generation: u64,
    cancel: CancellationToken,
}

// == Retry Executor ==
/// Retry runner with observable progress, one per call site.
///
/// Starting a new run or calling [`reset`](Self::reset) cancels any backoff
/// the previous run is waiting on. An attempt already in flight still
/// completes, but its outcome no longer reaches the observable state.
#[derive(Debug)]
pub struct RetryExecutor<T> {
    state: watch::Sender<RetryState<T>>,
    control: Mutex<RunControl>,
}

impl<T> Default for RetryExecutor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RetryExecutor<T> {
    // == Constructor ==
    /// Creates an executor in the `Idle` state.
    pub fn new() -> Self {
        let (state, _) = watch::channel(RetryState::default());
        Self {
            state,
            control: Mutex::new(RunControl {
                generation: 0,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<RetryState<T>> {
        self.state.subscribe()
    }

    // == Reset ==
    /// Returns the state to `Idle` and cancels any pending backoff.
    pub fn reset(&self) {
        let mut control = self.control.lock();
        control.generation += 1;
        control.cancel.cancel();
        control.cancel = CancellationToken::new();
        self.state.send_replace(RetryState::default());
    }

    fn begin(&self) -> (u64, CancellationToken) {
        let mut control = self.control.lock();
        control.generation += 1;
        control.cancel.cancel();
        control.cancel = CancellationToken::new();
        self.state.send_replace(RetryState::running());
        (control.generation, control.cancel.clone())
    }

    /// Applies `update` only while `generation` is still the current run.
    fn publish(&self, generation: u64, update: impl FnOnce(&mut RetryState<T>)) -> bool {
        let control = self.control.lock();
        if control.generation != generation {
            return false;
        }
        self.state.send_modify(update);
        true
    }
}

impl<T: Clone> RetryExecutor<T> {
    /// Snapshot of the current state.
    pub fn state(&self) -> RetryState<T> {
        self.state.borrow().clone()
    }

    // == Execute With Retry ==
    /// Runs `operation`, retrying transient failures with exponential backoff.
    ///
    /// Returns the value on success. On failure returns `None`; the reason is
    /// available as [`RetryState::error`]: the failing error's message for a
    /// fatal error, or `options.exhausted_message` once retries run out.
    pub async fn execute_with_retry<F, Fut, E>(
        &self,
        operation: F,
        options: &RetryOptions<E>,
    ) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.try_execute(operation, options).await.ok()
    }

    // == Try Execute ==
    /// Same as [`execute_with_retry`](Self::execute_with_retry), but reports
    /// why no value was produced.
    pub async fn try_execute<F, Fut, E>(
        &self,
        mut operation: F,
        options: &RetryOptions<E>,
    ) -> Result<T, RetryFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let (generation, cancel) = self.begin();
        let mut attempt: u32 = 0;

        loop {
            let error = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("Operation succeeded after {} attempts", attempt + 1);
                    }
                    self.publish(generation, |s| s.succeed(value.clone()));
                    return Ok(value);
                }
                Err(e) => e,
            };
            let message = error.to_string();

            if !options.should_retry(&error) {
                debug!("Error is not retryable: {}", message);
                self.publish(generation, |s| s.fail(message.clone()));
                return Err(RetryFailure::Fatal(message));
            }

            if attempt >= options.max_retries {
                warn!(
                    "All {} attempts exhausted. Last error: {}",
                    attempt + 1,
                    message
                );
                self.publish(generation, |s| s.fail(options.exhausted_message.clone()));
                return Err(RetryFailure::RetriesExhausted {
                    attempts: attempt + 1,
                    last_error: message,
                });
            }

            let delay = options.delay_for(attempt);
            attempt += 1;
            if !self.publish(generation, |s| s.retry_count = attempt) {
                return Err(RetryFailure::Cancelled);
            }

            warn!(
                "Attempt {}/{} failed: {}. Retrying in {:?}",
                attempt,
                options.max_retries + 1,
                message,
                delay
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => {
                    debug!("Pending retry cancelled");
                    return Err(RetryFailure::Cancelled);
                }
            }
        }
    }
}
