//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Guarded call:
//!     → timeouts.rs (budget = every attempt + every backoff gap)
//!     → registry.rs (admission for the named breaker)
//!     → retries.rs (attempt, classify, constant backoff via backoff.rs)
//!     → circuit_breaker.rs (rolling window, open/half-open/closed)
//! ```
//!
//! # Design Decisions
//! - Every guarded call has a deadline derived from its own retry tunables
//! - Retries use a constant backoff for a predictable worst case
//! - Circuit breaker prevents cascading failures
//! - Breaker state is per name and never persisted

pub mod backoff;
pub mod circuit_breaker;
pub mod registry;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{Admission, BreakerSnapshot, CircuitState};
pub use registry::{BreakerPermit, BreakerRegistry};
pub use retries::{default_classifier, Classification, RetryExecutor};
