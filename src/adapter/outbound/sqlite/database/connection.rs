//! Database connection management using Diesel ORM.
//!
//! Provides the connection factory handed to the
//! [`ConnectionPool`](crate::infrastructure::pool::ConnectionPool), migration
//! support, and per-connection SQLite tuning.

use std::path::Path;
use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use crate::error::{Error, Result};
use crate::infrastructure::config::server::DatabaseConfig;
use crate::infrastructure::pool::{ConnectionFactory, ConnectionPool};

/// Embedded database migrations compiled from the migrations/ directory.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Type alias for the pool of SQLite handles.
pub type DbPool = ConnectionPool<SqliteConnection>;

const MEMORY_URL: &str = ":memory:";

/// Open one tuned connection to the configured database.
///
/// Creates the database file's parent directory if needed.
///
/// # Errors
/// Returns an error if the directory cannot be created, the database cannot
/// be opened, or a pragma fails to apply.
pub fn open_connection(config: &DatabaseConfig) -> Result<SqliteConnection> {
    ensure_parent_dir(&config.url)?;
    let mut conn = SqliteConnection::establish(&config.url)?;
    configure_sqlite_connection(&mut conn, config)?;
    Ok(conn)
}

/// Factory the pool calls to open new handles.
#[must_use]
pub fn connection_factory(config: &DatabaseConfig) -> ConnectionFactory<SqliteConnection> {
    let config = config.clone();
    Arc::new(move || open_connection(&config))
}

/// Apply journal, sync, busy-timeout and cache settings to a fresh connection.
///
/// # Errors
/// Returns an error if a pragma fails to apply.
pub fn configure_sqlite_connection(
    conn: &mut SqliteConnection,
    config: &DatabaseConfig,
) -> Result<()> {
    // Negative cache_size is measured in KiB rather than pages.
    let pragmas = format!(
        "PRAGMA busy_timeout = {}; \
         PRAGMA journal_mode = {}; \
         PRAGMA synchronous = {}; \
         PRAGMA cache_size = -{}; \
         PRAGMA foreign_keys = ON;",
        config.busy_timeout_ms, config.journal_mode, config.synchronous, config.cache_size_kib,
    );
    conn.batch_execute(&pragmas)?;
    Ok(())
}

/// Run all pending database migrations on one connection.
///
/// # Errors
/// Returns an error if migrations fail.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Migration(e.to_string()))?;
    info!(applied = applied.len(), "Database migrations complete");
    Ok(())
}

/// Run pending migrations on a handle borrowed from the pool.
///
/// # Errors
/// Returns an error if no handle can be borrowed or migrations fail.
pub fn migrate(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get()?;
    run_migrations(&mut conn)
}

fn ensure_parent_dir(url: &str) -> Result<()> {
    if url == MEMORY_URL || url.starts_with("file:") {
        return Ok(());
    }
    match Path::new(url).parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}
