//! Guarded call orchestration.
//!
//! # Data Flow
//! ```text
//! call_using_circuit_breaker(name, request, body, config)
//!     → resolve CallConfig against CallDefaults
//!     → configure breaker timeout = max timeout budget
//!     → registry admission (rejected → fallback → CircuitOpen)
//!     → spawn worker: RetryExecutor over attempt_once
//!     → wait on oneshot result OR breaker deadline
//!     → record outcome on the permit
//!     → body bytes, or fallback → original error
//! ```
//!
//! # Design Decisions
//! - The worker is abandoned, never cancelled, when the deadline wins; its
//!   late result is dropped with the channel
//! - The worker is bounded by the budget, so abandonment cannot leak
//! - The fallback only observes; it never substitutes a response

use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{CallConfig, CallDefaults, EffectiveCallConfig, ResilienceConfig};
use crate::error::CallError;
use crate::http::client::{attempt_once, HttpTransport};
use crate::http::request::RequestSpec;
use crate::observability::metrics;
use crate::resilience::registry::BreakerRegistry;
use crate::resilience::retries::{default_classifier, RetryExecutor};

/// Runs HTTP requests behind named circuit breakers with retries.
#[derive(Clone)]
pub struct CircuitBreakerCaller {
    registry: Arc<BreakerRegistry>,
    transport: Arc<dyn HttpTransport>,
    defaults: CallDefaults,
}

impl CircuitBreakerCaller {
    pub fn new(
        registry: Arc<BreakerRegistry>,
        transport: Arc<dyn HttpTransport>,
        defaults: CallDefaults,
    ) -> Self {
        Self {
            registry,
            transport,
            defaults,
        }
    }

    /// Build a caller with its own registry from a validated configuration.
    pub fn from_config(config: &ResilienceConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let registry = Arc::new(BreakerRegistry::new(config.breaker.clone()));
        Self::new(registry, transport, config.defaults)
    }

    pub fn registry(&self) -> &Arc<BreakerRegistry> {
        &self.registry
    }

    pub fn defaults(&self) -> &CallDefaults {
        &self.defaults
    }

    /// Send `request` (with `body` re-attached on every attempt) through the
    /// breaker named `breaker_name`.
    pub async fn call_using_circuit_breaker(
        &self,
        breaker_name: &str,
        request: &RequestSpec,
        body: Option<Bytes>,
        config: &CallConfig,
    ) -> Result<Bytes, CallError> {
        let span = tracing::info_span!(
            "guarded_call",
            breaker = %breaker_name,
            call_id = %Uuid::new_v4()
        );
        self.guarded(breaker_name, request, body, config)
            .instrument(span)
            .await
    }

    async fn guarded(
        &self,
        breaker_name: &str,
        request: &RequestSpec,
        body: Option<Bytes>,
        config: &CallConfig,
    ) -> Result<Bytes, CallError> {
        let effective = config.resolve(&self.defaults);
        self.registry
            .configure_timeout(breaker_name, effective.max_timeout_budget());

        let permit = match self.registry.admit(breaker_name) {
            Ok(permit) => permit,
            Err(error) => return Err(self.fallback(breaker_name, error)),
        };
        let deadline = permit.timeout();

        let (tx, rx) = oneshot::channel();
        let worker = Worker {
            breaker: breaker_name.to_string(),
            transport: Arc::clone(&self.transport),
            request: request.clone(),
            body,
            effective,
        };
        tokio::spawn(worker.run(tx).in_current_span());

        let outcome = match tokio::time::timeout(deadline, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CallError::Transport(
                "retry task ended without reporting a result".to_string(),
            )),
            Err(_) => Err(CallError::Timeout {
                name: breaker_name.to_string(),
                budget_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        match outcome {
            Ok(bytes) => {
                permit.record_success();
                metrics::record_call(breaker_name, "success");
                tracing::info!(breaker = %breaker_name, bytes = bytes.len(), "Call in breaker successful");
                Ok(bytes)
            }
            Err(error) => {
                permit.record_failure();
                Err(self.fallback(breaker_name, error))
            }
        }
    }

    fn fallback(&self, breaker_name: &str, error: CallError) -> CallError {
        metrics::record_call(breaker_name, error.kind());
        tracing::warn!(
            breaker = %breaker_name,
            error = %error,
            circuit_open = self.registry.is_open(breaker_name),
            "In fallback for breaker"
        );
        error
    }
}

/// The retry sequence of one call, run on its own task.
struct Worker {
    breaker: String,
    transport: Arc<dyn HttpTransport>,
    request: RequestSpec,
    body: Option<Bytes>,
    effective: EffectiveCallConfig,
}

impl Worker {
    async fn run(self, tx: oneshot::Sender<Result<Bytes, CallError>>) {
        let executor = RetryExecutor::new(self.effective.retry_count, self.effective.backoff());
        let attempt_timeout = self.effective.attempt_timeout();
        let transport: &dyn HttpTransport = self.transport.as_ref();
        let request = &self.request;
        let body = self.body.as_ref();
        let breaker = self.breaker.as_str();

        let result = executor
            .run(
                move |_| async move {
                    let result = attempt_once(transport, request, body, attempt_timeout).await;
                    metrics::record_attempt(breaker, if result.is_ok() { "success" } else { "failure" });
                    result
                },
                default_classifier,
            )
            .await;

        if tx.send(result).is_err() {
            tracing::debug!(breaker = %breaker, "Caller stopped waiting, discarding late result");
        }
    }
}
