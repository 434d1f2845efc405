use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::circuit::{Circuit, CircuitState};
use crate::config::BreakerConfig;

/// One breaker per partner id, allocated lazily and evicted when unused.
///
/// Breaker creation is atomic per id: racing callers for an unseen
/// partner id never end up with two distinct `Circuit`s, since the whole
/// map is guarded by a single mutex and the entry API resolves the race.
pub struct BreakerRegistry {
    config: BreakerConfig,
    breakers: Mutex<HashMap<String, Arc<Mutex<Circuit>>>>,
    eviction_idle: Duration,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig, eviction_idle: Duration) -> Self {
        Self {
            config,
            breakers: Mutex::new(HashMap::new()),
            eviction_idle,
        }
    }

    fn breaker_for(&self, partner_id: &str) -> Arc<Mutex<Circuit>> {
        let mut breakers = self.breakers.lock().unwrap();
        breakers
            .entry(partner_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Circuit::new())))
            .clone()
    }

    /// Returns `true` if the call may proceed.
    pub fn acquire(&self, partner_id: &str) -> bool {
        let breaker = self.breaker_for(partner_id);
        let mut circuit = breaker.lock().unwrap();
        circuit.try_acquire(partner_id, &self.config)
    }

    pub fn record_success(&self, partner_id: &str, duration: Duration) {
        let breaker = self.breaker_for(partner_id);
        let mut circuit = breaker.lock().unwrap();
        circuit.record_success(partner_id, &self.config, duration);
    }

    pub fn record_failure(&self, partner_id: &str, duration: Duration) {
        let breaker = self.breaker_for(partner_id);
        let mut circuit = breaker.lock().unwrap();
        circuit.record_failure(partner_id, &self.config, duration);
    }

    pub fn state(&self, partner_id: &str) -> CircuitState {
        let breaker = self.breaker_for(partner_id);
        let circuit = breaker.lock().unwrap();
        circuit.state()
    }

    /// Removes breakers idle for longer than `eviction_idle`. Intended to
    /// be called on a fixed interval by `spawn_sweeper`.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut breakers = self.breakers.lock().unwrap();
        let before = breakers.len();
        breakers.retain(|partner_id, circuit| {
            let idle = now.duration_since(circuit.lock().unwrap().last_access());
            let keep = idle <= self.eviction_idle;
            if !keep {
                tracing::info!(partner_id, idle_secs = idle.as_secs(), "evicting idle circuit breaker");
            }
            keep
        });
        before - breakers.len()
    }

    /// Spawns the periodic eviction sweep on the given interval.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let evicted = registry.sweep();
                if evicted > 0 {
                    tracing::info!(evicted, "circuit breaker sweep evicted idle breakers");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_partners_get_distinct_breakers() {
        let registry = BreakerRegistry::new(BreakerConfig::default(), Duration::from_secs(3600));
        for _ in 0..10 {
            registry.record_failure("a", Duration::from_millis(1));
        }
        assert_eq!(registry.state("a"), CircuitState::Open);
        assert_eq!(registry.state("b"), CircuitState::Closed);
    }

    #[test]
    fn sweep_evicts_only_idle_breakers() {
        let registry = BreakerRegistry::new(BreakerConfig::default(), Duration::from_millis(10));
        registry.acquire("stale");
        std::thread::sleep(Duration::from_millis(15));
        registry.acquire("fresh");

        let evicted = registry.sweep();
        assert_eq!(evicted, 1);
        // "fresh" was just accessed and survives; "stale" is gone and
        // re-creating it starts a brand-new Closed breaker.
        assert_eq!(registry.state("fresh"), CircuitState::Closed);
    }
}
