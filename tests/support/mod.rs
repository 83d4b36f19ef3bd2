#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;
use warband::infrastructure::bootstrap::AppContext;
use warband::infrastructure::clock::SharedClock;
use warband::infrastructure::config::Config;
use warband::testkit;
use warband::testkit::clock::ManualClock;

/// Temporary SQLite database for integration tests, removed on drop.
pub struct TempDb {
    dir: TempDir,
    config: Config,
}

impl TempDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut config = Config::default();
        config.database.url = dir
            .path()
            .join("warband.db")
            .to_string_lossy()
            .into_owned();
        config.pool = testkit::config::pool(2, 4);
        // Concurrent writers may queue behind SQLite's write lock.
        config.pool.acquire_timeout_ms = 2_000;
        Self { dir, config }
    }

    pub fn config(&self) -> Config {
        self.config.clone()
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Build a migrated context driven by the system clock.
    pub fn context(&self) -> AppContext {
        let ctx = AppContext::build(self.config()).expect("build context");
        ctx.migrate().expect("run migrations");
        ctx
    }

    /// Build a migrated context driven by `clock`.
    pub fn context_with_clock(&self, clock: SharedClock) -> AppContext {
        let ctx = AppContext::build_with_clock(self.config(), clock).expect("build context");
        ctx.migrate().expect("run migrations");
        ctx
    }
}

/// Manual clock starting 1000 s after the epoch.
pub fn manual_clock() -> Arc<ManualClock> {
    ManualClock::at(1_000.0)
}
