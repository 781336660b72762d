//! Timeout budget computation.
//!
//! # Responsibilities
//! - Derive the breaker-side deadline from the retry tunables
//!
//! # Design Decisions
//! - The budget covers every attempt plus every backoff gap, so the breaker
//!   never times out a call that is still legitimately retrying
//! - Saturating arithmetic: absurd tunables clamp instead of wrapping

use std::time::Duration;

/// `timeout * (1 + retries) + backoff * retries`, in milliseconds.
pub fn max_timeout_budget_ms(timeout_ms: u64, retry_count: u32, backoff_ms: u64) -> u64 {
    let retries = u64::from(retry_count);
    timeout_ms
        .saturating_mul(retries.saturating_add(1))
        .saturating_add(backoff_ms.saturating_mul(retries))
}

/// Worst-case duration of a retry sequence.
pub fn max_timeout_budget(timeout_ms: u64, retry_count: u32, backoff_ms: u64) -> Duration {
    Duration::from_millis(max_timeout_budget_ms(timeout_ms, retry_count, backoff_ms))
}
