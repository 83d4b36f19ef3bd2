//! Fake pooled connections and a controllable factory.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::Error;
use crate::infrastructure::pool::ConnectionFactory;

/// Stand-in for a backend connection; records the order it was opened in.
#[derive(Debug, PartialEq, Eq)]
pub struct FakeConnection {
    pub serial: u64,
}

/// Factory whose successes are counted and which can be switched to fail.
#[derive(Debug, Clone, Default)]
pub struct CountingFactory {
    opened: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
}

impl CountingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory that fails from the start.
    pub fn failing() -> Self {
        let factory = Self::default();
        factory.set_failing(true);
        factory
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Connections successfully opened so far.
    pub fn opened(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }

    /// Type-erased factory function suitable for
    /// [`ConnectionPool::new`](crate::infrastructure::pool::ConnectionPool::new).
    pub fn factory(&self) -> ConnectionFactory<FakeConnection> {
        let opened = Arc::clone(&self.opened);
        let failing = Arc::clone(&self.failing);
        Arc::new(move || {
            if failing.load(Ordering::SeqCst) {
                return Err(Error::Connection("backend unavailable".into()));
            }
            let serial = opened.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(FakeConnection { serial })
        })
    }
}
