//! Circuit breaker for downstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: downstream assumed down, calls fail fast
//! - Half-Open: a single trial call tests recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: requests >= volume threshold and error % >= threshold within window
//! Open → Half-Open: first admission after the sleep window
//! Half-Open → Closed: trial call succeeds
//! Half-Open → Open: trial call fails
//! ```
//!
//! # Design Decisions
//! - Per-name circuit breaker (not global)
//! - Fail fast in Open state (no waiting for timeout)
//! - Single trial in Half-Open (prevents hammering recovering downstream)
//! - Time is passed in explicitly; the state machine never reads a clock

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::BreakerSettings;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Numeric encoding used by the state gauge.
    pub fn as_gauge(self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::HalfOpen => 1.0,
            CircuitState::Open => 2.0,
        }
    }
}

/// How a call was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Ordinary call through a closed breaker.
    Normal,
    /// The single half-open probe whose outcome decides the next state.
    Trial,
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    start: Instant,
    requests: u64,
    errors: u64,
}

/// Bucketed request/error counters covering the most recent window.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    window: Duration,
    bucket_width: Duration,
    buckets: VecDeque<Bucket>,
}

impl RollingWindow {
    pub fn new(window: Duration, buckets: u32) -> Self {
        let buckets = buckets.max(1);
        let bucket_width = (window / buckets).max(Duration::from_millis(1));
        Self {
            window,
            bucket_width,
            buckets: VecDeque::with_capacity(buckets as usize + 1),
        }
    }

    fn evict(&mut self, now: Instant) {
        while let Some(front) = self.buckets.front() {
            if now.saturating_duration_since(front.start) >= self.window {
                self.buckets.pop_front();
            } else {
                break;
            }
        }
    }

    /// Count one request, and one error when `failed`.
    pub fn record(&mut self, now: Instant, failed: bool) {
        self.evict(now);

        let needs_bucket = match self.buckets.back() {
            Some(last) => now.saturating_duration_since(last.start) >= self.bucket_width,
            None => true,
        };
        if needs_bucket {
            self.buckets.push_back(Bucket {
                start: now,
                requests: 0,
                errors: 0,
            });
        }

        if let Some(bucket) = self.buckets.back_mut() {
            bucket.requests += 1;
            if failed {
                bucket.errors += 1;
            }
        }
    }

    /// `(requests, errors)` observed within the window ending at `now`.
    pub fn counts(&self, now: Instant) -> (u64, u64) {
        self.buckets
            .iter()
            .filter(|b| now.saturating_duration_since(b.start) < self.window)
            .fold((0, 0), |(r, e), b| (r + b.requests, e + b.errors))
    }

    /// Start of the oldest live bucket.
    pub fn start_time(&self, now: Instant) -> Option<Instant> {
        self.buckets
            .iter()
            .find(|b| now.saturating_duration_since(b.start) < self.window)
            .map(|b| b.start)
    }

    pub fn reset(&mut self) {
        self.buckets.clear();
    }
}

/// Error percentage, rounded down. Zero when there were no requests.
pub fn error_percentage(requests: u64, errors: u64) -> u64 {
    if requests == 0 {
        0
    } else {
        errors.saturating_mul(100) / requests
    }
}

/// A transition caused by an admission or an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CircuitState,
    pub to: CircuitState,
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub consecutive_failures: u64,
    pub window_request_count: u64,
    pub window_error_count: u64,
    pub window_start_time: Option<Instant>,
    pub error_percentage: u64,
    pub opened_at: Option<Instant>,
    pub configured_timeout: Duration,
}

impl BreakerSnapshot {
    pub fn is_open(&self) -> bool {
        self.state == CircuitState::Open
    }
}

/// State machine for one named breaker.
#[derive(Debug)]
pub struct BreakerState {
    name: String,
    settings: BreakerSettings,
    state: CircuitState,
    consecutive_failures: u64,
    window: RollingWindow,
    opened_at: Option<Instant>,
    configured_timeout: Duration,
}

impl BreakerState {
    pub fn new(name: impl Into<String>, settings: BreakerSettings) -> Self {
        let window = RollingWindow::new(settings.rolling_window(), settings.rolling_buckets);
        let configured_timeout = settings.timeout();
        Self {
            name: name.into(),
            settings,
            state: CircuitState::Closed,
            consecutive_failures: 0,
            window,
            opened_at: None,
            configured_timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn settings(&self) -> &BreakerSettings {
        &self.settings
    }

    pub fn configured_timeout(&self) -> Duration {
        self.configured_timeout
    }

    /// Set the deadline for guarded calls. Returns true if the value changed.
    pub fn set_timeout(&mut self, timeout: Duration) -> bool {
        if self.configured_timeout == timeout {
            return false;
        }
        self.configured_timeout = timeout;
        true
    }

    /// Replace the tunables. Counters restart under the new window geometry.
    pub fn apply_settings(&mut self, settings: BreakerSettings) {
        if self.settings == settings {
            return;
        }
        self.window = RollingWindow::new(settings.rolling_window(), settings.rolling_buckets);
        self.configured_timeout = settings.timeout();
        self.settings = settings;
    }

    /// Decide whether a call may proceed. `None` means rejected.
    pub fn admit(&mut self, now: Instant) -> Option<(Admission, Option<Transition>)> {
        match self.state {
            CircuitState::Closed => Some((Admission::Normal, None)),
            CircuitState::Open => {
                let slept = self
                    .opened_at
                    .map(|at| now.saturating_duration_since(at) >= self.settings.sleep_window())
                    .unwrap_or(true);
                if !slept {
                    return None;
                }
                self.state = CircuitState::HalfOpen;
                Some((
                    Admission::Trial,
                    Some(Transition {
                        from: CircuitState::Open,
                        to: CircuitState::HalfOpen,
                    }),
                ))
            }
            // HalfOpen is only entered by admitting its trial, and the trial's
            // outcome always leaves it.
            CircuitState::HalfOpen => None,
        }
    }

    /// Apply the outcome of a call admitted as `admission`.
    pub fn record(&mut self, admission: Admission, success: bool, now: Instant) -> Option<Transition> {
        self.window.record(now, !success);
        if success {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures += 1;
        }

        let from = self.state;
        match (self.state, admission) {
            (CircuitState::HalfOpen, Admission::Trial) => {
                if success {
                    self.state = CircuitState::Closed;
                    self.opened_at = None;
                    self.window.reset();
                } else {
                    self.trip(now);
                }
            }
            (CircuitState::Closed, _) => {
                if self.window_unhealthy(now) {
                    self.trip(now);
                }
            }
            // Late outcomes of calls admitted before the current state only count.
            _ => {}
        }

        (from != self.state).then_some(Transition {
            from,
            to: self.state,
        })
    }

    /// Volume reached and error rate at or above the threshold.
    fn window_unhealthy(&self, now: Instant) -> bool {
        let (requests, errors) = self.window.counts(now);
        errors > 0
            && requests >= self.settings.request_volume_threshold
            && error_percentage(requests, errors) >= u64::from(self.settings.error_percent_threshold)
    }

    fn trip(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
    }

    /// Back to a fresh closed breaker, keeping name, settings and timeout.
    pub fn reset(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.window.reset();
        self.opened_at = None;
    }

    pub fn snapshot(&self, now: Instant) -> BreakerSnapshot {
        let (requests, errors) = self.window.counts(now);
        BreakerSnapshot {
            name: self.name.clone(),
            state: self.state,
            consecutive_failures: self.consecutive_failures,
            window_request_count: requests,
            window_error_count: errors,
            window_start_time: self.window.start_time(now),
            error_percentage: error_percentage(requests, errors),
            opened_at: self.opened_at,
            configured_timeout: self.configured_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> BreakerSettings {
        BreakerSettings {
            request_volume_threshold: 4,
            error_percent_threshold: 50,
            sleep_window_ms: 1000,
            rolling_window_ms: 10_000,
            rolling_buckets: 10,
            timeout_ms: 1000,
        }
    }

    fn admit_and_record(state: &mut BreakerState, success: bool, now: Instant) -> Option<Transition> {
        let (admission, _) = state.admit(now).expect("admitted");
        state.record(admission, success, now)
    }

    #[test]
    fn test_closed_trips_after_volume_and_error_rate() {
        let now = Instant::now();
        let mut breaker = BreakerState::new("svc", settings());

        assert_eq!(admit_and_record(&mut breaker, true, now), None);
        assert_eq!(admit_and_record(&mut breaker, false, now), None);
        assert_eq!(admit_and_record(&mut breaker, true, now), None);
        // 4 requests, 2 errors = 50%
        let transition = admit_and_record(&mut breaker, false, now);
        assert_eq!(
            transition,
            Some(Transition {
                from: CircuitState::Closed,
                to: CircuitState::Open
            })
        );
        assert_eq!(breaker.snapshot(now).opened_at, Some(now));
    }

    #[test]
    fn test_success_reaching_volume_trips_unhealthy_window() {
        let now = Instant::now();
        let mut breaker = BreakerState::new("svc", settings());
        for _ in 0..3 {
            assert_eq!(admit_and_record(&mut breaker, false, now), None);
        }
        // 4 requests, 3 errors = 75%; the success completes the volume.
        let transition = admit_and_record(&mut breaker, true, now);
        assert_eq!(
            transition,
            Some(Transition {
                from: CircuitState::Closed,
                to: CircuitState::Open
            })
        );
        assert!(breaker.admit(now).is_none());
    }

    #[test]
    fn test_healthy_window_at_volume_stays_closed() {
        let now = Instant::now();
        let mut breaker = BreakerState::new("svc", settings());
        admit_and_record(&mut breaker, false, now);
        for _ in 0..3 {
            assert_eq!(admit_and_record(&mut breaker, true, now), None);
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.snapshot(now).error_percentage, 25);
    }

    #[test]
    fn test_below_volume_never_trips() {
        let now = Instant::now();
        let mut breaker = BreakerState::new("svc", settings());
        for _ in 0..3 {
            admit_and_record(&mut breaker, false, now);
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.snapshot(now).consecutive_failures, 3);
    }

    #[test]
    fn test_open_rejects_until_sleep_window() {
        let now = Instant::now();
        let mut breaker = BreakerState::new("svc", settings());
        for _ in 0..4 {
            admit_and_record(&mut breaker, false, now);
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        assert!(breaker.admit(now + Duration::from_millis(999)).is_none());
        let (admission, transition) = breaker.admit(now + Duration::from_millis(1000)).unwrap();
        assert_eq!(admission, Admission::Trial);
        assert_eq!(
            transition,
            Some(Transition {
                from: CircuitState::Open,
                to: CircuitState::HalfOpen
            })
        );
    }

    #[test]
    fn test_half_open_admits_single_trial() {
        let now = Instant::now();
        let mut breaker = BreakerState::new("svc", settings());
        for _ in 0..4 {
            admit_and_record(&mut breaker, false, now);
        }
        let later = now + Duration::from_secs(2);
        assert!(breaker.admit(later).is_some());
        assert!(breaker.admit(later).is_none());
        assert!(breaker.admit(later + Duration::from_secs(5)).is_none());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_trial_success_closes_and_resets_window() {
        let now = Instant::now();
        let mut breaker = BreakerState::new("svc", settings());
        for _ in 0..4 {
            admit_and_record(&mut breaker, false, now);
        }
        let later = now + Duration::from_secs(2);
        let transition = admit_and_record(&mut breaker, true, later);
        assert_eq!(
            transition,
            Some(Transition {
                from: CircuitState::HalfOpen,
                to: CircuitState::Closed
            })
        );
        let snapshot = breaker.snapshot(later);
        assert_eq!(snapshot.window_request_count, 0);
        assert_eq!(snapshot.opened_at, None);
    }

    #[test]
    fn test_trial_failure_reopens_with_fresh_timestamp() {
        let now = Instant::now();
        let mut breaker = BreakerState::new("svc", settings());
        for _ in 0..4 {
            admit_and_record(&mut breaker, false, now);
        }
        let later = now + Duration::from_secs(2);
        admit_and_record(&mut breaker, false, later);
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.snapshot(later).opened_at, Some(later));
        assert!(breaker.admit(later + Duration::from_millis(500)).is_none());
    }

    #[test]
    fn test_late_normal_outcome_does_not_decide_trial() {
        let now = Instant::now();
        let mut breaker = BreakerState::new("svc", settings());
        let (early, _) = breaker.admit(now).unwrap();
        for _ in 0..4 {
            admit_and_record(&mut breaker, false, now);
        }
        let later = now + Duration::from_secs(2);
        let (trial, _) = breaker.admit(later).unwrap();

        assert_eq!(breaker.record(early, true, later), None);
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.record(trial, true, later);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_window_expires_old_buckets() {
        let now = Instant::now();
        let mut window = RollingWindow::new(Duration::from_secs(10), 10);
        window.record(now, true);
        window.record(now + Duration::from_secs(5), false);
        assert_eq!(window.counts(now + Duration::from_secs(5)), (2, 1));
        assert_eq!(window.counts(now + Duration::from_secs(11)), (1, 0));
        assert_eq!(window.counts(now + Duration::from_secs(16)), (0, 0));
        assert_eq!(window.start_time(now + Duration::from_secs(16)), None);
    }

    #[test]
    fn test_set_timeout_is_idempotent() {
        let mut breaker = BreakerState::new("svc", settings());
        assert!(breaker.set_timeout(Duration::from_millis(400)));
        let now = Instant::now();
        let before = breaker.snapshot(now);
        assert!(!breaker.set_timeout(Duration::from_millis(400)));
        assert_eq!(breaker.snapshot(now), before);
        assert_eq!(breaker.configured_timeout(), Duration::from_millis(400));
    }

    #[test]
    fn test_error_percentage() {
        assert_eq!(error_percentage(0, 0), 0);
        assert_eq!(error_percentage(3, 1), 33);
        assert_eq!(error_percentage(20, 10), 50);
    }
}
