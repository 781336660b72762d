//! Named breaker registry.
//!
//! # Responsibilities
//! - Create breakers lazily on first use of a name
//! - Serialize admission and outcome recording per name
//! - Hand out admission permits that always report an outcome
//!
//! # Design Decisions
//! - One mutex per breaker; unrelated names never contend
//! - The registry is an explicit object shared via `Arc`, not a global
//! - Breakers live as long as the registry

use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::BreakerSettings;
use crate::error::CallError;
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{
    Admission, BreakerSnapshot, BreakerState, CircuitState, Transition,
};

type Entry = Arc<Mutex<BreakerState>>;

fn lock(entry: &Entry) -> MutexGuard<'_, BreakerState> {
    // A panic while holding the lock cannot leave the counters half-written.
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}

fn log_transition(name: &str, transition: Transition) {
    match transition.to {
        CircuitState::Open => tracing::warn!(
            breaker = %name,
            from = ?transition.from,
            "Circuit opened"
        ),
        CircuitState::HalfOpen => tracing::info!(breaker = %name, "Circuit half-open, admitting trial call"),
        CircuitState::Closed => tracing::info!(breaker = %name, "Circuit closed"),
    }
    metrics::record_state(name, transition.to);
}

/// Process-lifetime registry of circuit breakers keyed by name.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    breakers: DashMap<String, Entry>,
    defaults: BreakerSettings,
}

impl BreakerRegistry {
    /// Create a registry whose breakers start from `defaults`.
    pub fn new(defaults: BreakerSettings) -> Self {
        Self {
            breakers: DashMap::new(),
            defaults,
        }
    }

    pub fn defaults(&self) -> &BreakerSettings {
        &self.defaults
    }

    fn entry(&self, name: &str) -> Entry {
        if let Some(entry) = self.breakers.get(name) {
            return Arc::clone(entry.value());
        }
        let entry = self.breakers.entry(name.to_string()).or_insert_with(|| {
            tracing::debug!(breaker = %name, "Creating circuit breaker");
            Arc::new(Mutex::new(BreakerState::new(name, self.defaults.clone())))
        });
        Arc::clone(entry.value())
    }

    /// Override every tunable of one breaker.
    pub fn configure(&self, name: &str, settings: BreakerSettings) {
        lock(&self.entry(name)).apply_settings(settings);
    }

    /// Set the deadline guarded calls on `name` are given. Idempotent.
    pub fn configure_timeout(&self, name: &str, timeout: Duration) {
        if lock(&self.entry(name)).set_timeout(timeout) {
            tracing::debug!(breaker = %name, timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX), "Breaker timeout configured");
        }
    }

    /// Deadline currently configured for `name`.
    pub fn timeout(&self, name: &str) -> Duration {
        lock(&self.entry(name)).configured_timeout()
    }

    /// Ask the breaker for permission to run one call.
    pub fn admit(&self, name: &str) -> Result<BreakerPermit, CallError> {
        let entry = self.entry(name);
        let mut state = lock(&entry);
        let decision = state
            .admit(Instant::now())
            .map(|(admission, transition)| (admission, transition, state.configured_timeout()));
        drop(state);

        match decision {
            Some((admission, transition, timeout)) => {
                if let Some(transition) = transition {
                    log_transition(name, transition);
                }
                Ok(BreakerPermit {
                    name: name.to_string(),
                    admission,
                    timeout,
                    entry,
                    recorded: false,
                })
            }
            None => {
                metrics::record_rejection(name);
                Err(CallError::CircuitOpen {
                    name: name.to_string(),
                })
            }
        }
    }

    /// Current state of `name`, without creating it.
    pub fn state(&self, name: &str) -> Option<CircuitState> {
        self.breakers.get(name).map(|e| {
            let state = lock(e.value());
            state.state()
        })
    }

    /// Whether `name` is currently open. Unknown names are closed.
    pub fn is_open(&self, name: &str) -> bool {
        self.state(name) == Some(CircuitState::Open)
    }

    pub fn snapshot(&self, name: &str) -> Option<BreakerSnapshot> {
        let now = Instant::now();
        self.breakers.get(name).map(|e| {
            let state = lock(e.value());
            state.snapshot(now)
        })
    }

    /// Snapshots of every known breaker.
    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        let now = Instant::now();
        self.breakers
            .iter()
            .map(|e| {
                let state = lock(e.value());
                state.snapshot(now)
            })
            .collect()
    }

    /// Close `name` and clear its counters.
    pub fn reset(&self, name: &str) {
        if let Some(entry) = self.breakers.get(name) {
            lock(entry.value()).reset();
            metrics::record_state(name, CircuitState::Closed);
            tracing::info!(breaker = %name, "Circuit breaker reset");
        }
    }

    /// Forget every breaker.
    pub fn flush(&self) {
        self.breakers.clear();
        tracing::info!("Circuit breaker registry flushed");
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}

/// Permission to run one guarded call.
///
/// Exactly one outcome is recorded per permit. Dropping an unrecorded permit
/// counts as a failure so a half-open trial always resolves.
#[derive(Debug)]
pub struct BreakerPermit {
    name: String,
    admission: Admission,
    timeout: Duration,
    entry: Entry,
    recorded: bool,
}

impl BreakerPermit {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn admission(&self) -> Admission {
        self.admission
    }

    /// Deadline observed at admission.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn record_success(mut self) {
        self.record(true);
    }

    pub fn record_failure(mut self) {
        self.record(false);
    }

    fn record(&mut self, success: bool) {
        if self.recorded {
            return;
        }
        self.recorded = true;
        let transition = lock(&self.entry).record(self.admission, success, Instant::now());
        if let Some(transition) = transition {
            log_transition(&self.name, transition);
        }
    }
}

impl Drop for BreakerPermit {
    fn drop(&mut self) {
        if !self.recorded {
            tracing::debug!(breaker = %self.name, "Permit dropped without outcome, counting failure");
            self.record(false);
        }
    }
}
