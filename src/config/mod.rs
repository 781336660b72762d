//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML text (owned by the host application)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ResilienceConfig (validated, immutable)
//!     → CallDefaults to the caller, BreakerSettings to the registry
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Per-call `CallConfig` zero fields fall back to `CallDefaults`
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{parse_config, ConfigError};
pub use schema::{
    BreakerSettings, CallConfig, CallDefaults, EffectiveCallConfig, ObservabilityConfig,
    ResilienceConfig,
};
pub use validation::{validate_breaker, validate_config, ValidationError};
