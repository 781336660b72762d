//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Retry loop, breaker registry, caller produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//! ```
//!
//! # Design Decisions
//! - Structured fields (breaker, attempt, status, call_id) for machine parsing
//! - Call ID flows through every line of one guarded call
//! - Sinks belong to the host application

pub mod logging;
pub mod metrics;
