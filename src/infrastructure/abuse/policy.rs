//! Ordered abuse rules.
//!
//! Rules are evaluated top to bottom and the first one that fires names the
//! block reason. Reordering [`ABUSE_POLICY`] changes which reason a client
//! that trips several rules is reported under.

use std::fmt;

use serde::{Serialize, Serializer};

use super::tracker::ClientMetrics;
use crate::infrastructure::config::abuse::AbuseConfig;

/// Why a client was denied service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockReason {
    ExcessiveRequestRate,
    HighFailureRate,
    PersistentRateLimitViolations,
    /// Blocked by an operator.
    Manual,
}

impl BlockReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExcessiveRequestRate => "excessive request rate",
            Self::HighFailureRate => "high failure rate",
            Self::PersistentRateLimitViolations => "persistent rate limit violations",
            Self::Manual => "manual block",
        }
    }

    #[must_use]
    pub const fn is_automatic(self) -> bool {
        !matches!(self, Self::Manual)
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BlockReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Numeric limits the rules compare metrics against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbuseThresholds {
    pub max_requests_per_minute: f64,
    pub max_failure_rate: f64,
    pub max_rate_limit_rate: f64,
    pub min_requests_for_abuse: usize,
}

impl From<&AbuseConfig> for AbuseThresholds {
    fn from(config: &AbuseConfig) -> Self {
        Self {
            max_requests_per_minute: f64::from(config.max_requests_per_minute),
            max_failure_rate: config.max_failure_rate,
            max_rate_limit_rate: config.max_rate_limit_rate,
            min_requests_for_abuse: config.min_requests_for_abuse,
        }
    }
}

/// A single (predicate, reason) pair.
#[derive(Clone, Copy)]
pub struct AbuseRule {
    pub reason: BlockReason,
    pub fires: fn(&ClientMetrics, &AbuseThresholds) -> bool,
}

impl fmt::Debug for AbuseRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbuseRule")
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// Rules in priority order.
pub const ABUSE_POLICY: [AbuseRule; 3] = [
    AbuseRule {
        reason: BlockReason::ExcessiveRequestRate,
        fires: |m, t| m.requests_per_minute() > t.max_requests_per_minute,
    },
    AbuseRule {
        reason: BlockReason::HighFailureRate,
        fires: |m, t| m.failure_rate > t.max_failure_rate,
    },
    AbuseRule {
        reason: BlockReason::PersistentRateLimitViolations,
        fires: |m, t| m.throttle_rate > t.max_rate_limit_rate,
    },
];

/// Judge a metrics snapshot. `None` means the client stays active.
///
/// Clients with fewer than `min_requests_for_abuse` requests in the window
/// are never judged.
#[must_use]
pub fn evaluate(metrics: &ClientMetrics, thresholds: &AbuseThresholds) -> Option<BlockReason> {
    if metrics.total_requests < thresholds.min_requests_for_abuse {
        return None;
    }
    ABUSE_POLICY
        .iter()
        .find(|rule| (rule.fires)(metrics, thresholds))
        .map(|rule| rule.reason)
}
