use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Simulation configuration parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Wall-clock milliseconds between ticks while running (default: 1000).
    pub tick_interval_ms: u64,
    /// Seed for deterministic RNG.
    pub rng_seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            rng_seed: 42,
        }
    }
}

impl SimConfig {
    /// Tick period, never shorter than one millisecond.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
