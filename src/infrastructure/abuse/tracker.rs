//! Per-client sliding-window request ledgers.
//!
//! Each client identity owns a [`ClientLedger`] behind its own mutex, so
//! appends and prunes for one client never wait on another. The map itself is
//! a [`DashMap`]; its shard lock is held only long enough to clone the
//! ledger's `Arc`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

use crate::domain::ClientId;
use crate::infrastructure::clock::SharedClock;

/// Status code recorded for requests rejected by the rate limiter.
pub const THROTTLED_STATUS: u16 = 429;

/// One completed request: when it finished and the status it was answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestEvent {
    pub at: Duration,
    pub status: u16,
}

impl RequestEvent {
    /// A 4xx/5xx answer other than a throttling rejection.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        (400..600).contains(&self.status) && self.status != THROTTLED_STATUS
    }

    #[must_use]
    pub fn is_throttled(&self) -> bool {
        self.status == THROTTLED_STATUS
    }
}

/// Derived request metrics for one client over the current window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClientMetrics {
    pub total_requests: usize,
    pub failed_requests: usize,
    pub throttled_requests: usize,
    /// Percentage (0-100) of requests that failed.
    pub failure_rate: f64,
    /// Percentage (0-100) of requests rejected by the rate limiter.
    pub throttle_rate: f64,
    pub requests_per_second: f64,
}

impl ClientMetrics {
    #[must_use]
    pub fn requests_per_minute(&self) -> f64 {
        self.requests_per_second * 60.0
    }

    fn from_events<'a>(events: impl ExactSizeIterator<Item = &'a RequestEvent>) -> Self {
        let total = events.len();
        if total == 0 {
            return Self::default();
        }

        let mut failed = 0;
        let mut throttled = 0;
        let mut oldest = Duration::MAX;
        let mut newest = Duration::ZERO;
        for event in events {
            if event.is_failure() {
                failed += 1;
            } else if event.is_throttled() {
                throttled += 1;
            }
            oldest = oldest.min(event.at);
            newest = newest.max(event.at);
        }

        let span = (newest - oldest).as_secs_f64().max(1.0);
        let pct = |n: usize| n as f64 / total as f64 * 100.0;
        Self {
            total_requests: total,
            failed_requests: failed,
            throttled_requests: throttled,
            failure_rate: pct(failed),
            throttle_rate: pct(throttled),
            requests_per_second: total as f64 / span,
        }
    }
}

/// Time-ordered events for one client, plus when the client was last seen.
#[derive(Debug, Default)]
pub struct ClientLedger {
    events: VecDeque<RequestEvent>,
    last_seen: Duration,
}

impl ClientLedger {
    fn push(&mut self, event: RequestEvent) {
        self.last_seen = self.last_seen.max(event.at);
        self.events.push_back(event);
    }

    /// Drop events at or before `now - window`.
    fn prune(&mut self, now: Duration, window: Duration) {
        // Before the first full window has elapsed nothing can be stale.
        let Some(cutoff) = now.checked_sub(window) else {
            return;
        };
        self.events.retain(|event| event.at > cutoff);
    }

    fn metrics(&self) -> ClientMetrics {
        ClientMetrics::from_events(self.events.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Tracks recent request outcomes per client identity.
pub struct RequestTracker {
    ledgers: DashMap<ClientId, Arc<Mutex<ClientLedger>>>,
    window: Duration,
    clock: SharedClock,
}

impl RequestTracker {
    #[must_use]
    pub fn new(window: Duration, clock: SharedClock) -> Self {
        Self {
            ledgers: DashMap::new(),
            window,
            clock,
        }
    }

    /// Append an outcome for `client`, prune its ledger, and return the
    /// metrics as of this request.
    ///
    /// Append, prune and measurement happen under the client's lock, so the
    /// returned snapshot includes every earlier record for the same client.
    pub fn record(&self, client: &ClientId, status: u16) -> ClientMetrics {
        let ledger = self.ledger(client);
        let now = self.clock.now();

        let mut ledger = ledger.lock();
        ledger.push(RequestEvent { at: now, status });
        ledger.prune(now, self.window);
        ledger.metrics()
    }

    /// Current metrics for `client`. Unknown clients report zeros.
    #[must_use]
    pub fn metrics(&self, client: &ClientId) -> ClientMetrics {
        let Some(ledger) = self.ledgers.get(client).map(|entry| Arc::clone(entry.value())) else {
            return ClientMetrics::default();
        };
        let now = self.clock.now();

        let mut ledger = ledger.lock();
        ledger.prune(now, self.window);
        ledger.metrics()
    }

    /// Events currently retained for `client`, after pruning.
    #[must_use]
    pub fn event_count(&self, client: &ClientId) -> usize {
        let Some(ledger) = self.ledgers.get(client).map(|entry| Arc::clone(entry.value())) else {
            return 0;
        };
        let now = self.clock.now();

        let mut ledger = ledger.lock();
        ledger.prune(now, self.window);
        ledger.len()
    }

    /// Evict ledgers that are empty after pruning and were last written at
    /// least `idle` ago. Returns how many were dropped.
    ///
    /// Ledgers a concurrent recorder has already looked up are skipped.
    pub fn gc(&self, idle: Duration) -> usize {
        let now = self.clock.now();
        let window = self.window;
        let before = self.ledgers.len();

        self.ledgers.retain(|_, ledger| {
            if Arc::strong_count(ledger) > 1 {
                return true;
            }
            let Some(mut ledger) = ledger.try_lock() else {
                return true;
            };
            ledger.prune(now, window);
            !(ledger.is_empty() && now.saturating_sub(ledger.last_seen) >= idle)
        });

        before.saturating_sub(self.ledgers.len())
    }

    /// Number of tracked client ledgers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ledgers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ledgers.is_empty()
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    fn ledger(&self, client: &ClientId) -> Arc<Mutex<ClientLedger>> {
        if let Some(entry) = self.ledgers.get(client) {
            return Arc::clone(entry.value());
        }
        Arc::clone(
            self.ledgers
                .entry(client.clone())
                .or_default()
                .value(),
        )
    }
}
