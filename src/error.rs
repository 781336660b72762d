//! Error definitions for guarded calls.

use thiserror::Error;

/// Errors returned by a guarded call.
///
/// Every failure path surfaces one of these to the caller verbatim; the
/// fallback only observes them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    /// Network or connection failure before a status line was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// Downstream answered with a 5xx status.
    #[error("status was {status}")]
    ServerError { status: u16 },

    /// The breaker rejected admission.
    #[error("circuit '{name}' is open")]
    CircuitOpen { name: String },

    /// The breaker-side deadline elapsed before a result arrived.
    #[error("breaker '{name}' timed out after {budget_ms} ms")]
    Timeout { name: String, budget_ms: u64 },

    /// The status was acceptable but the body could not be read.
    #[error("failed to read response body: {0}")]
    Read(String),
}

impl CallError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CallError::ServerError { status } => Some(*status),
            _ => None,
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CallError::CircuitOpen { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CallError::Timeout { .. })
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CallError::Transport(_) => "transport",
            CallError::ServerError { .. } => "server_error",
            CallError::CircuitOpen { .. } => "circuit_open",
            CallError::Timeout { .. } => "timeout",
            CallError::Read(_) => "read",
        }
    }
}

/// Result type for guarded calls.
pub type CallResult<T> = Result<T, CallError>;
