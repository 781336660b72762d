//! Resilient invocation of outbound HTTP requests.
//!
//! A guarded call runs its request with bounded constant-backoff retries,
//! inside a named circuit breaker, under a deadline derived from its own
//! retry tunables.
//!
//! ```text
//!  caller ──▶ CircuitBreakerCaller ──▶ BreakerRegistry (admission)
//!                    │                        │
//!                    │ spawn                  │ permit
//!                    ▼                        ▼
//!              RetryExecutor ──▶ HttpTransport ──▶ downstream
//!                    │
//!                    └── oneshot result ──▶ race with breaker deadline
//! ```

pub mod caller;
pub mod config;
pub mod error;
pub mod http;
pub mod observability;
pub mod resilience;

pub use caller::CircuitBreakerCaller;
pub use config::{BreakerSettings, CallConfig, CallDefaults, ResilienceConfig};
pub use error::{CallError, CallResult};
pub use http::{HttpTransport, ReqwestTransport, RequestSpec};
pub use resilience::{BreakerRegistry, CircuitState};
