//! Readiness reporting.

use serde::Serialize;

use crate::infrastructure::abuse::DetectorStats;
use crate::infrastructure::pool::{ConnectionPool, PoolStats};
use crate::port::WarriorStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    name: &'static str,
    critical: bool,
    status: HealthStatus,
}

impl HealthCheck {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn critical(&self) -> bool {
        self.critical
    }

    pub fn status(&self) -> &HealthStatus {
        &self.status
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthStatus::Healthy)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    healthy: bool,
    checks: Vec<HealthCheck>,
    pool: PoolStats,
}

impl HealthReport {
    fn new(checks: Vec<HealthCheck>, pool: PoolStats) -> Self {
        let healthy = checks
            .iter()
            .filter(|check| check.critical())
            .all(HealthCheck::is_healthy);
        Self {
            healthy,
            checks,
            pool,
        }
    }

    pub fn checks(&self) -> &[HealthCheck] {
        &self.checks
    }

    pub fn pool(&self) -> &PoolStats {
        &self.pool
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }
}

/// Snapshot served by the admin stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub pool: PoolStats,
    pub abuse: DetectorStats,
}

/// Probe the pool and the database behind it.
///
/// Blocks while the store borrows a handle and runs its ping query, so async
/// callers should run it on a blocking thread.
pub fn health_check<C>(store: &dyn WarriorStore, pool: &ConnectionPool<C>) -> HealthReport {
    let ping = store.ping();
    // Read after the ping, which may have grown or repaired the pool.
    let pool = pool.stats();
    let mut checks = Vec::new();

    checks.push(HealthCheck {
        name: "pool",
        critical: true,
        status: if pool.closed {
            HealthStatus::Unhealthy("connection pool is closed".to_string())
        } else {
            HealthStatus::Healthy
        },
    });

    checks.push(HealthCheck {
        name: "database",
        critical: true,
        status: match ping {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        },
    });

    checks.push(HealthCheck {
        name: "pool_capacity",
        critical: false,
        status: if pool.live < pool.initial_size {
            HealthStatus::Unhealthy(format!(
                "{} of {} initial connections open",
                pool.live, pool.initial_size
            ))
        } else {
            HealthStatus::Healthy
        },
    });

    HealthReport::new(checks, pool)
}
