//! Connection pool driving real SQLite handles.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use diesel::prelude::*;
use warband::adapter::outbound::sqlite::database::connection::{connection_factory, DbPool};
use warband::error::PoolError;
use warband::infrastructure::config::server::DatabaseConfig;
use warband::testkit;

use support::TempDb;

const SHORT: Duration = Duration::from_millis(20);

fn sqlite_pool(db: &TempDb, initial: usize, max: usize) -> DbPool {
    DbPool::new(
        testkit::config::pool(initial, max),
        connection_factory(&db.config().database),
    )
    .unwrap()
}

fn select_one(conn: &mut SqliteConnection) {
    diesel::sql_query("SELECT 1").execute(conn).unwrap();
}

// ---------------------------------------------------------------------------
// Capacity
// ---------------------------------------------------------------------------

#[test]
fn test_opens_initial_handles() {
    let db = TempDb::new();
    let pool = sqlite_pool(&db, 3, 5);
    let stats = pool.stats();
    assert_eq!(stats.live, 3);
    assert_eq!(stats.idle, 3);
    assert_eq!(stats.created, 3);
}

#[test]
fn test_grows_after_timeout_then_exhausts() {
    let db = TempDb::new();
    let pool = sqlite_pool(&db, 1, 2);

    let first = pool.get_timeout(SHORT).unwrap();
    let second = pool.get_timeout(SHORT).unwrap();
    assert_ne!(first.id(), second.id());
    assert_eq!(pool.live_count(), 2);

    let err = pool.get_timeout(SHORT).unwrap_err();
    assert_eq!(err, PoolError::Exhausted { max_connections: 2 });
    assert_eq!(pool.stats().exhausted, 1);

    drop(first);
    let mut third = pool.get_timeout(SHORT).unwrap();
    select_one(&mut third);
}

#[test]
fn test_unopenable_database_reports_create_failure() {
    let db = TempDb::new();
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: dir.path().to_string_lossy().into_owned(),
        ..db.config().database
    };
    let pool = DbPool::new(testkit::config::pool(2, 2), connection_factory(&config)).unwrap();
    assert_eq!(pool.live_count(), 0);

    let err = pool.get_timeout(SHORT).unwrap_err();
    assert!(matches!(err, PoolError::ConnectionCreateFailed(_)));
    assert!(err.is_transient());
}

// ---------------------------------------------------------------------------
// Self-healing
// ---------------------------------------------------------------------------

#[test]
fn test_broken_handle_is_replaced_with_a_fresh_connection() {
    let db = TempDb::new();
    let pool = sqlite_pool(&db, 1, 1);

    let broken_id = {
        let mut conn = pool.get().unwrap();
        conn.mark_broken();
        conn.id()
    };

    let stats = pool.stats();
    assert_eq!(stats.discarded, 1);
    assert_eq!(stats.created, 2);
    assert_eq!(stats.live, 1);

    let mut conn = pool.get().unwrap();
    assert_ne!(conn.id(), broken_id);
    select_one(&mut conn);
}

#[test]
fn test_repeated_failures_keep_capacity() {
    let db = TempDb::new();
    let pool = sqlite_pool(&db, 2, 2);

    for _ in 0..5 {
        let mut conn = pool.get().unwrap();
        conn.mark_broken();
    }

    let stats = pool.stats();
    assert_eq!(stats.live, 2);
    assert_eq!(stats.idle, 2);
    assert_eq!(stats.discarded, 5);
    assert_eq!(stats.replacement_failures, 0);
}

// ---------------------------------------------------------------------------
// Concurrency and shutdown
// ---------------------------------------------------------------------------

#[test]
fn test_concurrent_loans_stay_within_cap() {
    let db = TempDb::new();
    let mut config = testkit::config::pool(1, 3);
    config.acquire_timeout_ms = 2_000;
    let pool = Arc::new(DbPool::new(config, connection_factory(&db.config().database)).unwrap());
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..6)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            thread::spawn(move || {
                for _ in 0..20 {
                    let mut conn = pool.get().unwrap();
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    select_one(&mut conn);
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) <= 3);
    let stats = pool.stats();
    assert!(stats.live <= 3);
    assert_eq!(stats.in_use, 0);
}

#[test]
fn test_shutdown_closes_loaned_handles_on_release() {
    let db = TempDb::new();
    let pool = sqlite_pool(&db, 2, 2);

    let conn = pool.get().unwrap();
    pool.shutdown();
    assert_eq!(pool.live_count(), 1);
    assert_eq!(pool.get_timeout(SHORT).unwrap_err(), PoolError::Closed);

    drop(conn);
    assert_eq!(pool.live_count(), 0);
    assert!(pool.stats().closed);
}
