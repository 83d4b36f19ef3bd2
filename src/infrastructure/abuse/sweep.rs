//! Amortised scheduling for map-wide cleanup passes.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Decides when a caller may run a full sweep of a keyed map.
///
/// A sweep is due once the map holds more than `floor` entries and either
/// the map has doubled since the last sweep or `interval` has passed. At most
/// one caller claims each sweep, so a map that cannot shrink yet is not
/// rescanned on every insert.
#[derive(Debug)]
pub(super) struct SweepSchedule {
    floor: usize,
    interval_ms: u64,
    rearm_at: AtomicUsize,
    last_sweep_ms: AtomicU64,
    sweeps: AtomicU64,
}

impl SweepSchedule {
    pub(super) fn new(floor: usize, interval: Duration) -> Self {
        Self {
            floor,
            interval_ms: millis(interval),
            rearm_at: AtomicUsize::new(floor),
            last_sweep_ms: AtomicU64::new(0),
            sweeps: AtomicU64::new(0),
        }
    }

    /// Claim the next sweep for a map holding `len` entries at `now`.
    pub(super) fn try_claim(&self, len: usize, now: Duration) -> bool {
        if len <= self.floor {
            return false;
        }
        let now_ms = millis(now);
        let last = self.last_sweep_ms.load(Ordering::Acquire);
        let grown = len > self.rearm_at.load(Ordering::Relaxed);
        let stale = now_ms.saturating_sub(last) >= self.interval_ms;
        if !(grown || stale) {
            return false;
        }
        let claimed = self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok();
        if claimed {
            self.sweeps.fetch_add(1, Ordering::Relaxed);
        }
        claimed
    }

    /// Record the map size left by a finished sweep.
    pub(super) fn finish(&self, remaining: usize) {
        self.rearm_at
            .store(remaining.saturating_mul(2).max(self.floor), Ordering::Relaxed);
    }

    pub(super) fn sweeps(&self) -> u64 {
        self.sweeps.load(Ordering::Relaxed)
    }
}

fn millis(at: Duration) -> u64 {
    u64::try_from(at.as_millis()).unwrap_or(u64::MAX)
}
