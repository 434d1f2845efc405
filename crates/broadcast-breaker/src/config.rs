use std::time::Duration;

/// Fixed breaker parameters, the same for every partner; there is no
/// per-partner override in this version.
#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    pub window_size: usize,
    pub minimum_calls: usize,
    pub failure_rate_threshold: f64,
    pub slow_call_rate_threshold: f64,
    pub slow_call_threshold: Duration,
    pub open_duration: Duration,
    pub permitted_calls_in_half_open: usize,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            minimum_calls: 5,
            failure_rate_threshold: 0.5,
            slow_call_rate_threshold: 0.5,
            slow_call_threshold: Duration::from_millis(2000),
            open_duration: Duration::from_secs(10),
            permitted_calls_in_half_open: 3,
        }
    }
}
