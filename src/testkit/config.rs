//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use crate::infrastructure::config::abuse::{AbuseConfig, RateLimitConfig};
use crate::infrastructure::config::pool::PoolConfig;

/// Pool config with the given sizes and short timeouts, so exhaustion tests
/// finish in milliseconds.
pub fn pool(initial_size: usize, max_connections: usize) -> PoolConfig {
    PoolConfig {
        initial_size,
        max_connections,
        acquire_timeout_ms: 50,
        health_probe_timeout_ms: 50,
    }
}

/// Production default thresholds.
pub fn abuse() -> AbuseConfig {
    AbuseConfig::default()
}

/// Rate limit config allowing `requests_per_minute` per client.
pub fn rate_limit(requests_per_minute: u32) -> RateLimitConfig {
    RateLimitConfig {
        enabled: true,
        requests_per_minute,
    }
}
