//! Manually driven clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::clock::Clock;

/// Clock frozen at a settable instant, with millisecond resolution.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    /// Clock reading `secs` seconds after the epoch.
    pub fn at(secs: f64) -> Arc<Self> {
        let clock = Arc::new(Self::default());
        clock.set(secs);
        clock
    }

    /// Jump to `secs` seconds after the epoch.
    pub fn set(&self, secs: f64) {
        self.millis
            .store((secs * 1000.0).round() as u64, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}
