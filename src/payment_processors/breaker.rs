use std::time::{Duration, Instant};

use tracing::warn;

use super::structs::ProcessorId;

/// Consecutive failures tolerated before the breaker trips; the call after
/// this many failures opens the circuit.
pub const FAILURE_THRESHOLD: u32 = 10;

/// How long an open breaker waits before admitting a half-open probe.
pub const OPEN_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Per-processor circuit breaker.
///
/// Closed -> Open      when consecutive failures exceed `FAILURE_THRESHOLD`
/// Open -> HalfOpen    once `OPEN_TIMEOUT` has elapsed
/// HalfOpen -> Closed  on the next successful call
/// HalfOpen -> Open    on the next failed call
#[derive(Debug)]
pub struct Breaker {
    processor: ProcessorId,
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Instant,
}

impl Breaker {
    pub fn new(processor: ProcessorId) -> Self {
        Breaker {
            processor,
            state: BreakerState::Closed,
            consecutive_failures: 0,
            opened_at: Instant::now(),
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    /// Whether a call may be issued now. An open breaker admits nothing
    /// until `OPEN_TIMEOUT` has elapsed, at which point it flips to
    /// half-open and admits the probe.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if self.state == BreakerState::Open {
            if now.duration_since(self.opened_at) <= OPEN_TIMEOUT {
                return false;
            }
            self.state = BreakerState::HalfOpen;
            warn!(processor = %self.processor, "circuit breaker half-open, probing");
        }
        true
    }

    pub fn on_success(&mut self) {
        if self.state != BreakerState::Closed {
            warn!(processor = %self.processor, "circuit breaker closed");
        }
        self.state = BreakerState::Closed;
        self.consecutive_failures = 0;
    }

    pub fn on_failure(&mut self, now: Instant) {
        self.consecutive_failures += 1;
        match self.state {
            BreakerState::HalfOpen => self.trip(now),
            BreakerState::Closed if self.consecutive_failures > FAILURE_THRESHOLD => {
                self.trip(now)
            }
            _ => {}
        }
    }

    fn trip(&mut self, now: Instant) {
        self.state = BreakerState::Open;
        self.opened_at = now;
        warn!(
            processor = %self.processor,
            consecutive_failures = self.consecutive_failures,
            "circuit breaker open"
        );
    }
}
