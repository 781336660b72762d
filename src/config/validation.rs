//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds, window sizes)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ResilienceConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::{BreakerSettings, ResilienceConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("breaker.error_percent_threshold must be between 1 and 100, got {0}")]
    ErrorPercentOutOfRange(u8),

    #[error("breaker.rolling_window_ms must be greater than 0")]
    EmptyRollingWindow,

    #[error("breaker.rolling_buckets must be between 1 and rolling_window_ms ({window_ms}), got {buckets}")]
    InvalidBucketCount { buckets: u32, window_ms: u64 },

    #[error("breaker.request_volume_threshold must be greater than 0")]
    ZeroVolumeThreshold,

    #[error("unknown log level '{0}'")]
    UnknownLogLevel(String),
}

/// Check a whole configuration, collecting every problem found.
pub fn validate_config(config: &ResilienceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = validate_breaker(&config.breaker)
        .err()
        .unwrap_or_default();

    let level = config.observability.log_level.to_ascii_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check breaker tunables on their own (also used by per-name overrides).
pub fn validate_breaker(settings: &BreakerSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.error_percent_threshold == 0 || settings.error_percent_threshold > 100 {
        errors.push(ValidationError::ErrorPercentOutOfRange(
            settings.error_percent_threshold,
        ));
    }
    if settings.request_volume_threshold == 0 {
        errors.push(ValidationError::ZeroVolumeThreshold);
    }
    if settings.rolling_window_ms == 0 {
        errors.push(ValidationError::EmptyRollingWindow);
    } else if settings.rolling_buckets == 0
        || u64::from(settings.rolling_buckets) > settings.rolling_window_ms
    {
        errors.push(ValidationError::InvalidBucketCount {
            buckets: settings.rolling_buckets,
            window_ms: settings.rolling_window_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
