//! Abuse detection and rate limiting configuration.

use std::time::Duration;

use serde::Deserialize;

/// Thresholds for the adaptive abuse detector.
///
/// A client is judged only once it has `min_requests_for_abuse` requests in
/// the trailing `window_secs` window.
#[derive(Debug, Clone, Deserialize)]
pub struct AbuseConfig {
    /// Whether requests are tracked and abusive clients blocked at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Trailing window over which metrics are computed (seconds).
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Requests per minute above which a client is considered automated.
    #[serde(default = "default_max_requests_per_minute")]
    pub max_requests_per_minute: u32,
    /// Failure percentage (0-100) above which a client is blocked.
    #[serde(default = "default_max_failure_rate")]
    pub max_failure_rate: f64,
    /// Throttled percentage (0-100) above which a client is blocked.
    #[serde(default = "default_max_rate_limit_rate")]
    pub max_rate_limit_rate: f64,
    /// How long an automatic or default manual block lasts (seconds).
    #[serde(default = "default_block_duration_secs")]
    pub block_duration_secs: u64,
    /// Minimum requests in the window before any judgement is made.
    #[serde(default = "default_min_requests_for_abuse")]
    pub min_requests_for_abuse: usize,
    /// Ledger count above which idle, empty ledgers are evicted.
    #[serde(default = "default_max_tracked_clients")]
    pub max_tracked_clients: usize,
    /// Minimum idle time before an empty ledger may be evicted (seconds).
    #[serde(default = "default_ledger_idle_secs")]
    pub ledger_idle_secs: u64,
    /// Client identities that are never tracked or blocked.
    #[serde(default)]
    pub whitelist: Vec<String>,
}

const fn default_enabled() -> bool {
    true
}

const fn default_window_secs() -> u64 {
    60
}

const fn default_max_requests_per_minute() -> u32 {
    200
}

const fn default_max_failure_rate() -> f64 {
    50.0
}

const fn default_max_rate_limit_rate() -> f64 {
    90.0
}

const fn default_block_duration_secs() -> u64 {
    300 // 5 minutes
}

const fn default_min_requests_for_abuse() -> usize {
    20
}

const fn default_max_tracked_clients() -> usize {
    100_000
}

const fn default_ledger_idle_secs() -> u64 {
    600
}

impl AbuseConfig {
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    #[must_use]
    pub fn block_duration(&self) -> Duration {
        Duration::from_secs(self.block_duration_secs)
    }

    #[must_use]
    pub fn ledger_idle(&self) -> Duration {
        Duration::from_secs(self.ledger_idle_secs)
    }
}

impl Default for AbuseConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            window_secs: default_window_secs(),
            max_requests_per_minute: default_max_requests_per_minute(),
            max_failure_rate: default_max_failure_rate(),
            max_rate_limit_rate: default_max_rate_limit_rate(),
            block_duration_secs: default_block_duration_secs(),
            min_requests_for_abuse: default_min_requests_for_abuse(),
            max_tracked_clients: default_max_tracked_clients(),
            ledger_idle_secs: default_ledger_idle_secs(),
            whitelist: Vec::new(),
        }
    }
}

/// Per-client fixed-window request limit applied ahead of the handlers.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Requests allowed per client per 60-second window.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

const fn default_requests_per_minute() -> u32 {
    100
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            requests_per_minute: default_requests_per_minute(),
        }
    }
}
