//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! RequestSpec + body bytes (owned by the caller)
//!     → request.rs (fresh reqwest::Request per attempt)
//!     → client.rs (transport send, status classification)
//!     → body bytes or CallError back to the retry loop
//! ```

pub mod client;
pub mod request;

pub use client::{attempt_once, AttemptResponse, HttpTransport, ReqwestTransport};
pub use request::RequestSpec;
