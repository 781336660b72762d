//! Outbound HTTP transport.
//!
//! # Responsibilities
//! - Send one materialized request and report status and body
//! - Turn a single attempt into success or a classified error
//!
//! # Design Decisions
//! - `HttpTransport` is the seam to the network; tests substitute it
//! - Status < 500 is success, its body is read; status >= 500 is a failure
//! - Connection reuse is the underlying client's business

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::error::CallError;
use crate::http::request::RequestSpec;

/// What one attempt received from the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResponse {
    pub status: u16,
    /// Response body. Transports only read it for status < 500.
    pub body: Bytes,
}

/// Executes one HTTP request.
#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    /// Errors are `CallError::Transport` before a status line and
    /// `CallError::Read` when the body could not be read.
    async fn send(&self, request: reqwest::Request) -> Result<AttemptResponse, CallError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, CallError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CallError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: reqwest::Request) -> Result<AttemptResponse, CallError> {
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 500 {
            return Ok(AttemptResponse {
                status,
                body: Bytes::new(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CallError::Read(e.to_string()))?;
        Ok(AttemptResponse { status, body })
    }
}

/// Perform a single attempt and apply the success criterion.
pub async fn attempt_once(
    transport: &dyn HttpTransport,
    spec: &RequestSpec,
    body: Option<&Bytes>,
    timeout: Duration,
) -> Result<Bytes, CallError> {
    let response = transport.send(spec.build(body, timeout)).await?;
    if response.status >= 500 {
        return Err(CallError::ServerError {
            status: response.status,
        });
    }
    Ok(response.body)
}
