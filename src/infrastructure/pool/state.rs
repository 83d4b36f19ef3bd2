//! Connection pool internal state types.
//!
//! Provides the idle queue and the shared counters updated by acquisition,
//! release and replacement paths.

use std::collections::VecDeque;
use std::sync::atomic::AtomicU64;

use super::ResourceHandle;

/// Idle handles plus the shutdown flag, guarded together by one mutex so a
/// waiter can never miss the transition to closed.
pub(super) struct IdleState<C> {
    pub(super) handles: VecDeque<ResourceHandle<C>>,
    pub(super) closed: bool,
}

impl<C> IdleState<C> {
    pub(super) fn with_capacity(capacity: usize) -> Self {
        Self {
            handles: VecDeque::with_capacity(capacity),
            closed: false,
        }
    }
}

/// Shared counters updated atomically by pool operations.
///
/// Provides observability metrics for the connection pool.
pub(super) struct SharedCounters {
    /// Total handles opened, initial ones and replacements included.
    pub(super) created: AtomicU64,
    /// Total handles discarded because the borrower reported them unhealthy.
    pub(super) discarded: AtomicU64,
    /// Replacement attempts that failed after a discard.
    pub(super) replacement_failures: AtomicU64,
    /// Acquisitions refused because the pool was at capacity.
    pub(super) exhausted: AtomicU64,
    /// Acquisitions refused because the factory failed while growing.
    pub(super) create_failures: AtomicU64,
}

impl SharedCounters {
    /// Create a new set of zeroed counters.
    pub(super) fn new() -> Self {
        Self {
            created: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            replacement_failures: AtomicU64::new(0),
            exhausted: AtomicU64::new(0),
            create_failures: AtomicU64::new(0),
        }
    }
}
