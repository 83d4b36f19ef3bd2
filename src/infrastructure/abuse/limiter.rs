//! Fixed-window per-client rate limiter.

use std::time::Duration;

use dashmap::DashMap;

use super::sweep::SweepSchedule;
use crate::domain::ClientId;
use crate::infrastructure::clock::SharedClock;
use crate::infrastructure::config::abuse::RateLimitConfig;

/// Length of one rate-limit window.
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Window count above which stale windows are swept on the next check.
const GC_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Duration,
    count: u32,
}

/// Outcome of one rate-limit check, with the values for the
/// `X-RateLimit-*` response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Window reset instant, whole seconds since the Unix epoch.
    pub reset_at: u64,
    /// Seconds until the window resets, rounded up.
    pub retry_after_secs: u64,
}

/// Counts requests per client in fixed 60-second windows.
pub struct RateLimiter {
    limit: u32,
    windows: DashMap<ClientId, Window>,
    sweep: SweepSchedule,
    clock: SharedClock,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: &RateLimitConfig, clock: SharedClock) -> Self {
        Self {
            limit: config.requests_per_minute,
            windows: DashMap::new(),
            sweep: SweepSchedule::new(GC_THRESHOLD, RATE_WINDOW),
            clock,
        }
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Count one request from `client` and decide whether it may proceed.
    ///
    /// A rejected request still counts, so a client hammering past the limit
    /// stays rejected until the window rolls over.
    pub fn check(&self, client: &ClientId) -> RateDecision {
        let now = self.clock.now();
        if self.sweep.try_claim(self.windows.len(), now) {
            self.gc();
            self.sweep.finish(self.windows.len());
        }

        let window = {
            let mut entry = self.windows.entry(client.clone()).or_insert(Window {
                started: now,
                count: 0,
            });
            if now >= entry.started + RATE_WINDOW {
                *entry = Window {
                    started: now,
                    count: 0,
                };
            }
            entry.count = entry.count.saturating_add(1);
            *entry
        };

        let resets = window.started + RATE_WINDOW;
        let until_reset = resets.saturating_sub(now);
        RateDecision {
            allowed: window.count <= self.limit,
            limit: self.limit,
            remaining: self.limit.saturating_sub(window.count),
            reset_at: resets.as_secs_f64().ceil() as u64,
            retry_after_secs: until_reset.as_secs_f64().ceil() as u64,
        }
    }

    /// Drop windows that have already rolled over.
    pub fn gc(&self) {
        let now = self.clock.now();
        self.windows
            .retain(|_, window| now < window.started + RATE_WINDOW);
    }

    /// Automatic sweeps run by [`check`](Self::check) so far.
    #[must_use]
    pub fn sweeps(&self) -> u64 {
        self.sweep.sweeps()
    }

    /// Clients with a live window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
