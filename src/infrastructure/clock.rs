//! Wall-clock abstraction for time-windowed bookkeeping.
//!
//! The request tracker, abuse detector and rate limiter never read the system
//! time directly; they ask a [`Clock`]. Tests substitute a manual clock so
//! window pruning and block expiry can be checked without sleeping.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of the current time, as an offset from the Unix epoch.
pub trait Clock: Send + Sync {
    /// Current time since the Unix epoch.
    fn now(&self) -> Duration;
}

/// Shared, type-erased clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// Clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
    }
}

/// Convenience constructor for the production clock.
#[must_use]
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}
