//! Bounded, self-healing pool of database handles.
//!
//! # Architecture
//!
//! Idle handles live in a queue guarded by a short-lived mutex; callers that
//! find the queue empty park on a condition variable until a handle is
//! released or their timeout elapses. Only then does the pool try to grow,
//! one creation at a time, up to `max_connections`.
//!
//! Handles are lent exclusively. A caller returns each handle exactly once,
//! flagging whether it is still usable:
//! - **healthy** handles go back to the idle queue
//! - **unhealthy** handles are discarded and the pool immediately attempts
//!   to open a replacement; a failed replacement is logged, not raised
//!
//! The pool never spawns threads. Growth, replacement and shutdown all run on
//! the calling thread.
//!
//! # Invariants
//!
//! - `0 <= live <= max_connections` at every instant
//! - every handle is either idle, on loan, or destroyed, never two at once
//! - `live` only increases inside the grow section, after the factory succeeds

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, PoolError, Result};
use crate::infrastructure::config::pool::PoolConfig;

mod guard;
mod handle;
mod replace;
mod state;

pub use guard::PooledConnection;
pub use handle::ResourceHandle;

use state::{IdleState, SharedCounters};

/// Factory function for opening new backend connections.
///
/// Supplied by the storage adapter. It may tune the connection after opening
/// it, but must return either a usable connection or an error.
pub type ConnectionFactory<C> = Arc<dyn Fn() -> Result<C> + Send + Sync>;

/// Tagged result of an acquisition attempt.
#[derive(Debug)]
pub enum AcquireOutcome<C> {
    /// A handle is now exclusively on loan to the caller.
    Acquired(ResourceHandle<C>),
    /// No idle handle appeared in time and the pool is at capacity.
    Exhausted,
    /// The pool had room to grow but the factory failed.
    CreateFailed(String),
    /// The pool has been shut down.
    Closed,
}

impl<C> AcquireOutcome<C> {
    /// Convert the outcome into a `Result`, naming the pool capacity on
    /// exhaustion.
    pub fn into_result(self, max_connections: usize) -> std::result::Result<ResourceHandle<C>, PoolError> {
        match self {
            Self::Acquired(handle) => Ok(handle),
            Self::Exhausted => Err(PoolError::Exhausted { max_connections }),
            Self::CreateFailed(reason) => Err(PoolError::ConnectionCreateFailed(reason)),
            Self::Closed => Err(PoolError::Closed),
        }
    }

    #[must_use]
    pub fn is_acquired(&self) -> bool {
        matches!(self, Self::Acquired(_))
    }
}

/// Point-in-time pool statistics for observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Live handles, idle plus on loan.
    pub live: usize,
    pub idle: usize,
    pub in_use: usize,
    pub initial_size: usize,
    pub max_connections: usize,
    /// Handles opened since start-up, including replacements.
    pub created: u64,
    /// Handles discarded as unhealthy.
    pub discarded: u64,
    pub replacement_failures: u64,
    /// Acquisitions that failed because the pool was at capacity.
    pub exhausted: u64,
    /// Acquisitions that failed because the factory failed.
    pub create_failures: u64,
    pub closed: bool,
}

/// Bounded pool of exclusive backend handles.
pub struct ConnectionPool<C> {
    config: PoolConfig,
    factory: ConnectionFactory<C>,
    idle: Mutex<IdleState<C>>,
    available: Condvar,
    live: AtomicUsize,
    /// Serializes growth and replacement so the capacity check and the
    /// `live` increment happen together.
    grow_lock: Mutex<()>,
    next_id: AtomicU64,
    counters: SharedCounters,
}

impl<C> ConnectionPool<C> {
    /// Create a pool and eagerly open `initial_size` handles.
    ///
    /// A handle the factory fails to open is skipped, so the pool may start
    /// below `initial_size` when the backend is unavailable at boot.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid:
    /// - `max_connections` must be > 0
    /// - `initial_size` must be <= `max_connections`
    pub fn new(config: PoolConfig, factory: ConnectionFactory<C>) -> Result<Self> {
        Self::validate_config(&config)?;

        let pool = Self {
            idle: Mutex::new(IdleState::with_capacity(config.max_connections)),
            available: Condvar::new(),
            live: AtomicUsize::new(0),
            grow_lock: Mutex::new(()),
            next_id: AtomicU64::new(1),
            counters: SharedCounters::new(),
            config,
            factory,
        };

        let requested = pool.config.initial_size;
        let mut opened = 0usize;
        for _ in 0..requested {
            match pool.open_handle() {
                Ok(handle) => {
                    pool.live.fetch_add(1, Ordering::SeqCst);
                    pool.idle.lock().handles.push_back(handle);
                    opened += 1;
                }
                Err(e) => warn!(error = %e, "Failed to open initial connection"),
            }
        }

        info!(
            requested,
            opened,
            max_connections = pool.config.max_connections,
            "Connection pool initialized"
        );
        Ok(pool)
    }

    /// Validate pool configuration values.
    fn validate_config(config: &PoolConfig) -> Result<()> {
        let invalid = |field: &'static str, reason: &str| -> crate::error::Error {
            ConfigError::InvalidValue {
                field,
                reason: reason.to_string(),
            }
            .into()
        };

        if config.max_connections == 0 {
            return Err(invalid("max_connections", "must be > 0"));
        }
        if config.initial_size > config.max_connections {
            return Err(invalid("initial_size", "must be <= max_connections"));
        }
        Ok(())
    }

    /// Try to borrow a handle, reporting the outcome as a tagged value.
    ///
    /// Waits up to `timeout` for an idle handle. If none appears and the pool
    /// is below capacity, opens a new one.
    pub fn try_acquire(&self, timeout: Duration) -> AcquireOutcome<C> {
        if let Some(outcome) = self.wait_for_idle(timeout) {
            return outcome;
        }
        self.grow()
    }

    /// Borrow a handle, waiting up to `timeout`.
    ///
    /// The caller must hand it back with [`release`](Self::release) exactly
    /// once. Prefer [`get_timeout`](Self::get_timeout), which does that on drop.
    ///
    /// # Errors
    ///
    /// - [`PoolError::Exhausted`] when at capacity and nothing was released in time
    /// - [`PoolError::ConnectionCreateFailed`] when growing failed
    /// - [`PoolError::Closed`] after [`shutdown`](Self::shutdown)
    pub fn acquire(&self, timeout: Duration) -> std::result::Result<ResourceHandle<C>, PoolError> {
        self.try_acquire(timeout)
            .into_result(self.config.max_connections)
    }

    /// Borrow a handle with the configured acquire timeout, returned on drop.
    ///
    /// # Errors
    ///
    /// See [`acquire`](Self::acquire).
    pub fn get(&self) -> std::result::Result<PooledConnection<'_, C>, PoolError> {
        self.get_timeout(self.config.acquire_timeout())
    }

    /// Borrow a handle waiting up to `timeout`, returned on drop.
    ///
    /// # Errors
    ///
    /// See [`acquire`](Self::acquire).
    pub fn get_timeout(
        &self,
        timeout: Duration,
    ) -> std::result::Result<PooledConnection<'_, C>, PoolError> {
        let handle = self.acquire(timeout)?;
        Ok(PooledConnection::new(self, handle))
    }

    /// Return a borrowed handle.
    ///
    /// Healthy handles are queued for reuse. Unhealthy ones are discarded and
    /// a replacement is opened on a best-effort basis.
    pub fn release(&self, handle: ResourceHandle<C>, healthy: bool) {
        if !(healthy && handle.is_alive()) {
            self.discard_and_replace(handle);
            return;
        }

        let mut idle = self.idle.lock();
        if idle.closed {
            drop(idle);
            self.retire(handle);
            return;
        }
        idle.handles.push_back(handle);
        drop(idle);
        self.available.notify_one();
    }

    /// Close every idle handle and refuse further acquisitions.
    ///
    /// Handles on loan are closed when they are released. Waiting callers wake
    /// up with [`PoolError::Closed`].
    pub fn shutdown(&self) {
        let drained: Vec<ResourceHandle<C>> = {
            let mut idle = self.idle.lock();
            if idle.closed {
                return;
            }
            idle.closed = true;
            idle.handles.drain(..).collect()
        };
        self.available.notify_all();

        let closed = drained.len();
        for handle in drained {
            self.retire(handle);
        }
        info!(
            closed,
            still_on_loan = self.live.load(Ordering::SeqCst),
            "Connection pool shut down"
        );
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.idle.lock().closed
    }

    /// Live handles, idle plus on loan.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.lock().handles.len()
    }

    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Runtime statistics for observability.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let (idle, closed) = {
            let guard = self.idle.lock();
            (guard.handles.len(), guard.closed)
        };
        let live = self.live.load(Ordering::SeqCst);
        PoolStats {
            live,
            idle,
            in_use: live.saturating_sub(idle),
            initial_size: self.config.initial_size,
            max_connections: self.config.max_connections,
            created: self.counters.created.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
            replacement_failures: self.counters.replacement_failures.load(Ordering::Relaxed),
            exhausted: self.counters.exhausted.load(Ordering::Relaxed),
            create_failures: self.counters.create_failures.load(Ordering::Relaxed),
            closed,
        }
    }

    /// Wait for an idle handle. `None` means the wait timed out.
    fn wait_for_idle(&self, timeout: Duration) -> Option<AcquireOutcome<C>> {
        let deadline = Instant::now().checked_add(timeout);
        let mut idle = self.idle.lock();
        loop {
            if idle.closed {
                return Some(AcquireOutcome::Closed);
            }
            if let Some(handle) = idle.handles.pop_front() {
                return Some(AcquireOutcome::Acquired(handle));
            }
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return None;
                    }
                    // Spurious and timed-out wakeups both loop back to re-check.
                    let _ = self.available.wait_until(&mut idle, deadline);
                }
                None => self.available.wait(&mut idle),
            }
        }
    }

    /// Open a new handle on demand if the pool has room.
    fn grow(&self) -> AcquireOutcome<C> {
        let _grow = self.grow_lock.lock();

        if self.is_closed() {
            return AcquireOutcome::Closed;
        }

        let live = self.live.load(Ordering::SeqCst);
        if live >= self.config.max_connections {
            self.counters.exhausted.fetch_add(1, Ordering::Relaxed);
            warn!(
                live,
                max_connections = self.config.max_connections,
                "Connection pool exhausted"
            );
            return AcquireOutcome::Exhausted;
        }

        match self.open_handle() {
            Ok(handle) => {
                self.live.fetch_add(1, Ordering::SeqCst);
                debug!(connection_id = handle.id(), live = live + 1, "Pool grew");
                AcquireOutcome::Acquired(handle)
            }
            Err(e) => {
                self.counters.create_failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "Failed to create connection while growing pool");
                AcquireOutcome::CreateFailed(e.to_string())
            }
        }
    }

    /// Invoke the factory and wrap the result. Does not touch `live`.
    fn open_handle(&self) -> Result<ResourceHandle<C>> {
        let conn = (self.factory)()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.counters.created.fetch_add(1, Ordering::Relaxed);
        Ok(ResourceHandle::new(id, conn))
    }

    /// Destroy a handle that is leaving the pool for good.
    fn retire(&self, handle: ResourceHandle<C>) {
        let id = handle.id();
        drop(handle);
        self.live.fetch_sub(1, Ordering::SeqCst);
        debug!(connection_id = id, "Connection closed");
    }
}
