//! Configuration schema definitions.
//!
//! Every tunable of a guarded call lives here. All types derive Serde traits
//! and carry `#[serde(default)]` so a partial document is always valid.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::resilience::timeouts::max_timeout_budget;

/// Root configuration for guarded calls.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Process-wide call defaults applied to zero `CallConfig` fields.
    pub defaults: CallDefaults,

    /// Default tunables for every breaker created by the registry.
    pub breaker: BreakerSettings,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Per-call tunables. A zero field means "use the process-wide default".
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct CallConfig {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,

    /// Number of retries after the initial attempt.
    pub retry_count: u32,

    /// Constant wait between attempts in milliseconds.
    pub backoff_ms: u64,
}

impl CallConfig {
    pub fn new(timeout_ms: u64, retry_count: u32, backoff_ms: u64) -> Self {
        Self {
            timeout_ms,
            retry_count,
            backoff_ms,
        }
    }

    /// Fill zero fields from `defaults`.
    pub fn resolve(&self, defaults: &CallDefaults) -> EffectiveCallConfig {
        fn pick<T: Default + PartialEq + Copy>(value: T, fallback: T) -> T {
            if value == T::default() {
                fallback
            } else {
                value
            }
        }

        EffectiveCallConfig {
            timeout_ms: pick(self.timeout_ms, defaults.timeout_ms),
            retry_count: pick(self.retry_count, defaults.retry_count),
            backoff_ms: pick(self.backoff_ms, defaults.backoff_ms),
        }
    }
}

/// Process-wide call defaults.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CallDefaults {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,

    /// Retries after the initial attempt.
    pub retry_count: u32,

    /// Constant backoff in milliseconds.
    pub backoff_ms: u64,
}

impl Default for CallDefaults {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            retry_count: 1,
            backoff_ms: 0,
        }
    }
}

/// Call tunables after defaults have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveCallConfig {
    pub timeout_ms: u64,
    pub retry_count: u32,
    pub backoff_ms: u64,
}

impl EffectiveCallConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Worst-case duration of the whole retry sequence.
    pub fn max_timeout_budget(&self) -> Duration {
        max_timeout_budget(self.timeout_ms, self.retry_count, self.backoff_ms)
    }
}

/// Circuit breaker tunables.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BreakerSettings {
    /// Minimum requests in the rolling window before the error rate is evaluated.
    pub request_volume_threshold: u64,

    /// Error percentage (0-100) at or above which the breaker trips.
    pub error_percent_threshold: u8,

    /// Time an open breaker waits before admitting a trial call, in milliseconds.
    pub sleep_window_ms: u64,

    /// Length of the rolling accounting window in milliseconds.
    pub rolling_window_ms: u64,

    /// Number of buckets the rolling window is split into.
    pub rolling_buckets: u32,

    /// Deadline used before a call has configured one, in milliseconds.
    pub timeout_ms: u64,
}

impl BreakerSettings {
    pub fn sleep_window(&self) -> Duration {
        Duration::from_millis(self.sleep_window_ms)
    }

    pub fn rolling_window(&self) -> Duration {
        Duration::from_millis(self.rolling_window_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            request_volume_threshold: 20,
            error_percent_threshold: 50,
            sleep_window_ms: 5000,
            rolling_window_ms: 10_000,
            rolling_buckets: 10,
            timeout_ms: 1000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
