//! Registry configuration

use std::time::Duration;

/// Default interval between idle sweeps (piggybacked on traffic)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(3000);

/// Shortest accepted sweep interval; `tokio::time::interval` rejects zero
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the stream registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Minimum time between two idle sweeps
    pub sweep_interval: Duration,

    /// Capacity of the registry event broadcast channel
    pub event_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            event_capacity: 64,
        }
    }
}

impl RegistryConfig {
    /// Set the idle sweep interval (at least 1 ms)
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval.max(MIN_SWEEP_INTERVAL);
        self
    }

    /// Set the event channel capacity (at least 1)
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}
