//! Retry logic.
//!
//! # Responsibilities
//! - Run an attempt up to `retry_count + 1` times
//! - Classify each failure as retryable or terminal
//! - Wait a constant backoff between retryable attempts
//!
//! # Design Decisions
//! - Attempts are strictly sequential; attempt k+1 starts after attempt k
//!   and its backoff have finished
//! - Connection errors, 5xx and unreadable bodies are retryable
//! - Breaker rejections and breaker timeouts are never retried

use std::future::Future;
use std::time::Duration;

use crate::error::CallError;
use crate::resilience::backoff::ConstantBackoff;

/// Outcome of classifying a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Try again if attempts remain.
    Retryable,
    /// Stop and surface this error.
    Terminal,
}

/// Classifier used by guarded calls.
pub fn default_classifier(error: &CallError) -> Classification {
    match error {
        CallError::Transport(_) | CallError::ServerError { .. } | CallError::Read(_) => {
            Classification::Retryable
        }
        CallError::CircuitOpen { .. } | CallError::Timeout { .. } => Classification::Terminal,
    }
}

/// One failed iteration of the retry loop.
#[derive(Debug)]
pub struct Attempt<'a> {
    pub number: u32,
    pub error: &'a CallError,
}

impl Attempt<'_> {
    pub fn status(&self) -> Option<u16> {
        self.error.status()
    }

    fn log(&self, classification: Classification) {
        tracing::warn!(
            attempt = self.number,
            status = ?self.status(),
            error = %self.error,
            classification = ?classification,
            "Retrier attempt failed"
        );
    }
}

/// Fixed-interval retry loop.
#[derive(Debug, Clone, Copy)]
pub struct RetryExecutor {
    retry_count: u32,
    backoff: ConstantBackoff,
}

impl RetryExecutor {
    pub fn new(retry_count: u32, backoff: Duration) -> Self {
        Self {
            retry_count,
            backoff: ConstantBackoff::new(backoff),
        }
    }

    /// Total number of attempts this executor will make at most.
    pub fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// Run `attempt_fn` until it succeeds, fails terminally, or attempts run out.
    ///
    /// `attempt_fn` receives the 1-based attempt number.
    pub async fn run<T, F, Fut, C>(&self, mut attempt_fn: F, classifier: C) -> Result<T, CallError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, CallError>>,
        C: Fn(&CallError) -> Classification,
    {
        let max_attempts = self.max_attempts();
        let mut number = 0;

        loop {
            number += 1;

            let error = match attempt_fn(number).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            let classification = classifier(&error);
            Attempt { number, error: &error }.log(classification);

            if classification == Classification::Terminal || number >= max_attempts {
                return Err(error);
            }

            self.backoff.wait(number).await;
        }
    }
}
