use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open { until: Instant },
}

/// Consecutive-failure gate in front of a tick's remote work.
///
/// Failures are recorded once per failed unit of work (a block, or the head
/// lookup), not once per inner retry. Reaching the threshold opens the breaker
/// for `cooldown`; the first `allow` after expiry closes it again with the
/// counter reset, so the next call acts as a probe.
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    consecutive_failures: u32,
    state: BreakerState,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown,
            consecutive_failures: 0,
            state: BreakerState::Closed,
        }
    }

    pub fn allow(&mut self, now: Instant) -> bool {
        match self.state {
            BreakerState::Closed => true,
            BreakerState::Open { until } if now < until => false,
            BreakerState::Open { .. } => {
                info!("Circuit breaker cool-down elapsed, allowing probe");
                self.state = BreakerState::Closed;
                self.consecutive_failures = 0;
                true
            }
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Passes a remote call's result through, clearing the failure streak when
    /// it succeeded. Failures are left for the caller to record.
    pub fn observe<T>(&mut self, result: anyhow::Result<T>) -> anyhow::Result<T> {
        if result.is_ok() {
            self.record_success();
        }
        result
    }

    pub fn record_failure(&mut self, now: Instant) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if self.consecutive_failures >= self.threshold {
            self.trip(now);
        }
    }

    /// Opens the breaker regardless of the failure streak, e.g. when the same
    /// unit of work keeps failing between otherwise successful calls.
    pub fn trip(&mut self, now: Instant) {
        if self.state != BreakerState::Closed {
            return;
        }
        warn!(
            "Circuit breaker opened after {} consecutive failures, pausing for {}s",
            self.consecutive_failures,
            self.cooldown.as_secs()
        );
        self.state = BreakerState::Open {
            until: now + self.cooldown,
        };
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }
}
