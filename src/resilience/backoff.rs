//! Constant backoff between attempts.

use std::time::Duration;

/// Fixed delay inserted between retry attempts.
///
/// The delay never grows, which keeps the worst-case latency of a call equal
/// to its timeout budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConstantBackoff {
    delay: Duration,
}

impl ConstantBackoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.delay
    }

    /// Wait out the delay following `attempt`. Zero delays do not yield.
    pub async fn wait(&self, attempt: u32) {
        let delay = self.delay(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
