//! Database connection pool configuration.

use std::time::Duration;

use serde::Deserialize;

/// Connection pool sizing and timeouts.
///
/// The pool eagerly opens `initial_size` handles at start-up and grows on
/// demand up to `max_connections`.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Handles opened eagerly when the pool is built.
    #[serde(default = "default_initial_size")]
    pub initial_size: usize,
    /// Hard cap on live handles (idle + on loan).
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// How long `acquire` waits for an idle handle before trying to grow
    /// (milliseconds).
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    /// Acquire timeout used by the readiness probe (milliseconds).
    #[serde(default = "default_health_probe_timeout_ms")]
    pub health_probe_timeout_ms: u64,
}

const fn default_initial_size() -> usize {
    20
}

const fn default_max_connections() -> usize {
    40
}

const fn default_acquire_timeout_ms() -> u64 {
    30_000
}

const fn default_health_probe_timeout_ms() -> u64 {
    10_000
}

impl PoolConfig {
    #[must_use]
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    #[must_use]
    pub fn health_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.health_probe_timeout_ms)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_size: default_initial_size(),
            max_connections: default_max_connections(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            health_probe_timeout_ms: default_health_probe_timeout_ms(),
        }
    }
}
