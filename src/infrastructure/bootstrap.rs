//! Composition root.
//!
//! Builds the single process-wide [`AppContext`] once at start-up. Collaborators
//! receive it explicitly; nothing here is global.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::sqlite::database::connection::{self, connection_factory, DbPool};
use crate::adapter::outbound::sqlite::SqliteWarriorStore;
use crate::error::Result;
use crate::infrastructure::abuse::{AbuseDetector, RateLimiter};
use crate::infrastructure::clock::{system_clock, SharedClock};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::health::{health_check, HealthReport, ServiceStats};
use crate::port::WarriorStore;

/// Shared services behind the HTTP surface and the CLI.
#[derive(Clone)]
pub struct AppContext {
    config: Arc<Config>,
    pool: Arc<DbPool>,
    store: Arc<dyn WarriorStore>,
    detector: Arc<AbuseDetector>,
    limiter: Arc<RateLimiter>,
}

impl AppContext {
    /// Open the connection pool and wire the services using the system clock.
    ///
    /// # Errors
    /// Returns an error if the pool configuration is invalid.
    pub fn build(config: Config) -> Result<Self> {
        Self::build_with_clock(config, system_clock())
    }

    /// Like [`build`](Self::build), with an explicit clock for the
    /// time-windowed services.
    ///
    /// # Errors
    /// Returns an error if the pool configuration is invalid.
    pub fn build_with_clock(config: Config, clock: SharedClock) -> Result<Self> {
        let pool = Arc::new(DbPool::new(
            config.pool.clone(),
            connection_factory(&config.database),
        )?);
        let store: Arc<dyn WarriorStore> = Arc::new(SqliteWarriorStore::new(Arc::clone(&pool)));
        let detector = Arc::new(AbuseDetector::new(&config.abuse, clock.clone()));
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit, clock));

        info!(
            database = %config.database.url,
            abuse_detection = config.abuse.enabled,
            rate_limit = config.rate_limit.enabled,
            "Application context ready"
        );

        Ok(Self {
            config: Arc::new(config),
            pool,
            store,
            detector,
            limiter,
        })
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    /// Returns an error if no handle can be borrowed or a migration fails.
    pub fn migrate(&self) -> Result<()> {
        connection::migrate(&self.pool)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &Arc<DbPool> {
        &self.pool
    }

    pub fn store(&self) -> &Arc<dyn WarriorStore> {
        &self.store
    }

    pub fn detector(&self) -> &Arc<AbuseDetector> {
        &self.detector
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Probe the database through the pool. Blocks.
    pub fn readiness(&self) -> HealthReport {
        health_check(self.store.as_ref(), &self.pool)
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            pool: self.pool.stats(),
            abuse: self.detector.stats(),
        }
    }

    /// Close idle handles and refuse further acquisitions.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}
