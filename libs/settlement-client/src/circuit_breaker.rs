// [libs/settlement-client/src/circuit_breaker.rs]
//! Per-instance circuit breaker (§4.H, §9 redesign flag: half-open is an
//! explicit third state, not a boolean flag on top of open/closed). A
//! single in-flight probe is allowed while half-open; any concurrent
//! caller arriving during the probe is turned away rather than allowed to
//! pile onto the same trial request.

use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: State,
    failure_count: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// What a caller must do before attempting the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    AllowAsProbe,
    Deny,
}

pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold,
            cooldown,
            inner: Mutex::new(Inner { state: State::Closed, failure_count: 0, opened_at: None, probe_in_flight: false }),
        }
    }

    /// Call before issuing a request. `Deny` means fail fast without
    /// touching the network.
    pub fn admit(&self) -> Admission {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        match inner.state {
            State::Closed => Admission::Allow,
            State::Open => {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or(Duration::MAX);
                if elapsed >= self.cooldown {
                    inner.state = State::HalfOpen;
                    inner.probe_in_flight = true;
                    info!("cnab-settlement-client: circuit cooldown elapsed, admitting half-open probe");
                    Admission::AllowAsProbe
                } else {
                    Admission::Deny
                }
            }
            State::HalfOpen => {
                if inner.probe_in_flight {
                    Admission::Deny
                } else {
                    inner.probe_in_flight = true;
                    Admission::AllowAsProbe
                }
            }
        }
    }

    pub fn record_success(&self, was_probe: bool) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        if was_probe {
            inner.probe_in_flight = false;
        }
        if inner.state != State::Closed {
            info!("cnab-settlement-client: circuit closing after successful probe");
        }
        inner.state = State::Closed;
        inner.failure_count = 0;
        inner.opened_at = None;
    }

    pub fn record_failure(&self, was_probe: bool) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        if was_probe {
            inner.probe_in_flight = false;
            warn!("cnab-settlement-client: half-open probe failed, reopening circuit");
            inner.state = State::Open;
            inner.opened_at = Some(Instant::now());
            return;
        }

        inner.failure_count += 1;
        if inner.failure_count >= self.failure_threshold {
            warn!(failure_count = inner.failure_count, "cnab-settlement-client: failure threshold reached, opening circuit");
            inner.state = State::Open;
            inner.opened_at = Some(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failures_and_denies_fast() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert_eq!(breaker.admit(), Admission::Allow);
            breaker.record_failure(false);
        }
        assert_eq!(breaker.admit(), Admission::Deny);
    }

    #[test]
    fn half_open_allows_a_single_probe_and_closes_on_success() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(0));
        assert_eq!(breaker.admit(), Admission::Allow);
        breaker.record_failure(false);

        // cooldown is zero, so the very next admit() transitions to half-open
        let admission = breaker.admit();
        assert_eq!(admission, Admission::AllowAsProbe);
        // a second concurrent caller must be denied while the probe is in flight
        assert_eq!(breaker.admit(), Admission::Deny);

        breaker.record_success(true);
        assert_eq!(breaker.admit(), Admission::Allow);
    }

    #[test]
    fn failed_probe_reopens_the_circuit() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(0));
        breaker.admit();
        breaker.record_failure(false);
        let admission = breaker.admit();
        assert_eq!(admission, Admission::AllowAsProbe);
        breaker.record_failure(true);
        assert_eq!(breaker.admit(), Admission::Deny);
    }
}
