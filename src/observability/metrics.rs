//! Metrics collection.
//!
//! # Metrics
//! - `breaker_calls_total` (counter): guarded calls by breaker, outcome
//! - `breaker_attempts_total` (counter): HTTP attempts by breaker, result
//! - `breaker_rejections_total` (counter): admissions refused by breaker
//! - `breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//!
//! # Design Decisions
//! - Only the `metrics` facade is used; the host installs a recorder
//! - Without a recorder every call is a no-op

use metrics::{counter, gauge};

use crate::resilience::circuit_breaker::CircuitState;

/// Record the final outcome of a guarded call.
pub fn record_call(breaker: &str, outcome: &'static str) {
    counter!(
        "breaker_calls_total",
        "breaker" => breaker.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record one HTTP attempt inside the retry loop.
pub fn record_attempt(breaker: &str, result: &'static str) {
    counter!(
        "breaker_attempts_total",
        "breaker" => breaker.to_string(),
        "result" => result
    )
    .increment(1);
}

/// Record a refused admission.
pub fn record_rejection(breaker: &str) {
    counter!("breaker_rejections_total", "breaker" => breaker.to_string()).increment(1);
}

/// Publish the current state of a breaker.
pub fn record_state(breaker: &str, state: CircuitState) {
    gauge!("breaker_state", "breaker" => breaker.to_string()).set(state.as_gauge());
}
