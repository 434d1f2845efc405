use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::BreakerConfig;

/// Represents the state of a single partner's circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
struct CallRecord {
    is_failure: bool,
    is_slow: bool,
}

/// A count-based sliding-window circuit breaker for a single partner.
///
/// This system always treats I/O errors, timeouts, and unhandled faults
/// as failures, so there is no pluggable failure classifier here — just a
/// plain acquire/record state machine.
pub(crate) struct Circuit {
    state: CircuitState,
    last_state_change: Instant,
    last_access: Instant,
    window: VecDeque<CallRecord>,
    half_open_outcomes: usize,
}

impl Circuit {
    pub(crate) fn new() -> Self {
        let now = Instant::now();
        Self {
            state: CircuitState::Closed,
            last_state_change: now,
            last_access: now,
            window: VecDeque::new(),
            half_open_outcomes: 0,
        }
    }

    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    pub(crate) fn last_access(&self) -> Instant {
        self.last_access
    }

    /// Returns `true` if the call may proceed. Transitions Open -> HalfOpen
    /// once `open_duration` has elapsed.
    pub(crate) fn try_acquire(&mut self, partner_id: &str, config: &BreakerConfig) -> bool {
        self.last_access = Instant::now();
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if self.last_state_change.elapsed() >= config.open_duration {
                    self.transition_to(partner_id, CircuitState::HalfOpen);
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => self.half_open_outcomes < config.permitted_calls_in_half_open,
        }
    }

    pub(crate) fn record_success(&mut self, partner_id: &str, config: &BreakerConfig, duration: Duration) {
        self.record(partner_id, config, duration, false);
    }

    pub(crate) fn record_failure(&mut self, partner_id: &str, config: &BreakerConfig, duration: Duration) {
        self.record(partner_id, config, duration, true);
    }

    fn record(&mut self, partner_id: &str, config: &BreakerConfig, duration: Duration, is_failure: bool) {
        let is_slow = duration >= config.slow_call_threshold;
        self.window.push_back(CallRecord { is_failure, is_slow });
        while self.window.len() > config.window_size {
            self.window.pop_front();
        }

        match self.state {
            CircuitState::HalfOpen => {
                self.half_open_outcomes += 1;
                if is_failure {
                    self.transition_to(partner_id, CircuitState::Open);
                } else if self.half_open_outcomes >= config.permitted_calls_in_half_open {
                    self.transition_to(partner_id, CircuitState::Closed);
                }
            }
            CircuitState::Closed => self.evaluate_window(partner_id, config),
            CircuitState::Open => {}
        }
    }

    fn evaluate_window(&mut self, partner_id: &str, config: &BreakerConfig) {
        let total = self.window.len();
        if total < config.minimum_calls || total < config.window_size {
            return;
        }

        let failures = self.window.iter().filter(|c| c.is_failure).count();
        let slow = self.window.iter().filter(|c| c.is_slow).count();
        let failure_rate = failures as f64 / total as f64;
        let slow_rate = slow as f64 / total as f64;

        if failure_rate >= config.failure_rate_threshold || slow_rate >= config.slow_call_rate_threshold {
            self.transition_to(partner_id, CircuitState::Open);
        }
    }

    fn transition_to(&mut self, partner_id: &str, state: CircuitState) {
        if self.state == state {
            return;
        }
        tracing::info!(partner_id, from = ?self.state, to = ?state, "circuit breaker state transition");
        self.state = state;
        self.last_state_change = Instant::now();
        self.window.clear();
        self.half_open_outcomes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_window_with_failures(circuit: &mut Circuit, config: &BreakerConfig, n: usize) {
        for _ in 0..n {
            circuit.record_failure("p", config, Duration::from_millis(10));
        }
    }

    #[test]
    fn opens_after_failure_rate_threshold_crossed() {
        let config = BreakerConfig {
            window_size: 10,
            minimum_calls: 5,
            ..Default::default()
        };
        let mut circuit = Circuit::new();
        fill_window_with_failures(&mut circuit, &config, 10);
        assert_eq!(circuit.state(), CircuitState::Open);
    }

    #[test]
    fn stays_closed_below_minimum_calls() {
        let config = BreakerConfig::default();
        let mut circuit = Circuit::new();
        fill_window_with_failures(&mut circuit, &config, 4);
        assert_eq!(circuit.state(), CircuitState::Closed);
    }

    #[test]
    fn rejects_while_open_and_half_opens_after_wait() {
        let config = BreakerConfig {
            window_size: 5,
            minimum_calls: 5,
            open_duration: Duration::from_millis(20),
            ..Default::default()
        };
        let mut circuit = Circuit::new();
        fill_window_with_failures(&mut circuit, &config, 5);
        assert_eq!(circuit.state(), CircuitState::Open);
        assert!(!circuit.try_acquire("p", &config));

        std::thread::sleep(Duration::from_millis(25));
        assert!(circuit.try_acquire("p", &config));
        assert_eq!(circuit.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn half_open_failure_reopens_immediately() {
        let config = BreakerConfig {
            window_size: 5,
            minimum_calls: 5,
            open_duration: Duration::from_millis(10),
            permitted_calls_in_half_open: 3,
            ..Default::default()
        };
        let mut circuit = Circuit::new();
        fill_window_with_failures(&mut circuit, &config, 5);
        std::thread::sleep(Duration::from_millis(15));
        assert!(circuit.try_acquire("p", &config));
        circuit.record_failure("p", &config, Duration::from_millis(1));
        assert_eq!(circuit.state(), CircuitState::Open);
    }

    #[test]
    fn half_open_success_quota_closes_circuit() {
        let config = BreakerConfig {
            window_size: 5,
            minimum_calls: 5,
            open_duration: Duration::from_millis(10),
            permitted_calls_in_half_open: 3,
            ..Default::default()
        };
        let mut circuit = Circuit::new();
        fill_window_with_failures(&mut circuit, &config, 5);
        std::thread::sleep(Duration::from_millis(15));

        for _ in 0..3 {
            assert!(circuit.try_acquire("p", &config));
            circuit.record_success("p", &config, Duration::from_millis(1));
        }
        assert_eq!(circuit.state(), CircuitState::Closed);
    }

    #[test]
    fn slow_calls_open_circuit_via_slow_call_rate() {
        let config = BreakerConfig {
            window_size: 10,
            minimum_calls: 5,
            slow_call_threshold: Duration::from_millis(5),
            slow_call_rate_threshold: 0.5,
            failure_rate_threshold: 1.1, // never trips on failure rate alone
            ..Default::default()
        };
        let mut circuit = Circuit::new();
        for _ in 0..10 {
            circuit.record_success("p", &config, Duration::from_millis(20));
        }
        assert_eq!(circuit.state(), CircuitState::Open);
    }
}
