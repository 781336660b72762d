//! Configuration parsing.
//!
//! The host application owns where configuration comes from; this module only
//! turns a TOML document into a validated `ResilienceConfig`.

use thiserror::Error;

use crate::config::schema::ResilienceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ResilienceConfig, ConfigError> {
    let config: ResilienceConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, ResilienceConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = parse_config(
            r#"
            [defaults]
            timeout_ms = 250
            retry_count = 3

            [breaker]
            sleep_window_ms = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.defaults.timeout_ms, 250);
        assert_eq!(config.defaults.retry_count, 3);
        assert_eq!(config.defaults.backoff_ms, 0);
        assert_eq!(config.breaker.sleep_window_ms, 1000);
        assert_eq!(config.breaker.request_volume_threshold, 20);
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_config("[defaults\ntimeout_ms = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_semantic_error() {
        let err = parse_config("[breaker]\nerror_percent_threshold = 150").unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::ErrorPercentOutOfRange(150)]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
