//! Adaptive abuse detector.
//!
//! Combines the [`RequestTracker`] with the ordered [`ABUSE_POLICY`](super::policy::ABUSE_POLICY)
//! and keeps the block list and whitelist. Every state change happens on the
//! caller's thread: block expiry is checked when the client is next looked
//! up, and idle ledgers are evicted when the tracked-client count grows past
//! its limit.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::policy::{evaluate, AbuseThresholds, BlockReason};
use super::sweep::SweepSchedule;
use super::tracker::{ClientMetrics, RequestTracker};
use crate::domain::ClientId;
use crate::infrastructure::clock::SharedClock;
use crate::infrastructure::config::abuse::AbuseConfig;

#[derive(Debug, Clone, Copy)]
struct BlockEntry {
    unblock_at: Duration,
    reason: BlockReason,
}

/// Details of an active block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockInfo {
    /// Unblock instant, seconds since the Unix epoch.
    pub unblock_at: f64,
    pub remaining_secs: f64,
    pub reason: BlockReason,
    pub metrics: ClientMetrics,
}

impl BlockInfo {
    /// Remaining block time rounded up to whole seconds, for `Retry-After`.
    #[must_use]
    pub fn retry_after_secs(&self) -> u64 {
        self.remaining_secs.ceil().max(0.0) as u64
    }
}

/// Everything the admin surface reports about one client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientStatus {
    pub client: ClientId,
    pub whitelisted: bool,
    pub blocked: bool,
    pub block: Option<BlockInfo>,
    pub metrics: ClientMetrics,
}

/// Detector-wide counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectorStats {
    pub tracked_clients: usize,
    pub blocked_clients: usize,
    pub whitelisted_clients: usize,
    pub automatic_blocks: u64,
    pub manual_blocks: u64,
    /// Ledger eviction passes run so far.
    pub ledger_sweeps: u64,
}

/// Decides which clients to deny and for how long.
pub struct AbuseDetector {
    enabled: bool,
    thresholds: AbuseThresholds,
    block_duration: Duration,
    ledger_idle: Duration,
    ledger_sweep: SweepSchedule,
    tracker: RequestTracker,
    blocks: DashMap<ClientId, BlockEntry>,
    whitelist: RwLock<HashSet<ClientId>>,
    clock: SharedClock,
    automatic_blocks: AtomicU64,
    manual_blocks: AtomicU64,
}

impl AbuseDetector {
    /// Build a detector and apply the configured whitelist.
    #[must_use]
    pub fn new(config: &AbuseConfig, clock: SharedClock) -> Self {
        let whitelist = config
            .whitelist
            .iter()
            .map(|client| ClientId::new(client.trim()))
            .collect();

        Self {
            enabled: config.enabled,
            thresholds: AbuseThresholds::from(config),
            block_duration: config.block_duration(),
            ledger_idle: config.ledger_idle(),
            ledger_sweep: SweepSchedule::new(config.max_tracked_clients, config.window()),
            tracker: RequestTracker::new(config.window(), clock.clone()),
            blocks: DashMap::new(),
            whitelist: RwLock::new(whitelist),
            clock,
            automatic_blocks: AtomicU64::new(0),
            manual_blocks: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record a finished request and block the client if it now looks abusive.
    ///
    /// Whitelisted clients are not tracked. Returns the reason when this call
    /// blocked the client.
    pub fn record_request(&self, client: &ClientId, status: u16) -> Option<BlockReason> {
        if !self.enabled || self.is_whitelisted(client) {
            return None;
        }

        let metrics = self.tracker.record(client, status);
        self.maybe_gc();

        let reason = evaluate(&metrics, &self.thresholds)?;
        let unblock_at = self.clock.now().saturating_add(self.block_duration);
        self.blocks
            .insert(client.clone(), BlockEntry { unblock_at, reason });
        self.automatic_blocks.fetch_add(1, Ordering::Relaxed);

        warn!(
            client = %client,
            reason = %reason,
            block_secs = self.block_duration.as_secs(),
            total_requests = metrics.total_requests,
            failed_requests = metrics.failed_requests,
            throttled_requests = metrics.throttled_requests,
            failure_rate = metrics.failure_rate,
            throttle_rate = metrics.throttle_rate,
            requests_per_minute = metrics.requests_per_minute(),
            "Blocked abusive client"
        );
        Some(reason)
    }

    /// Whether requests from `client` should currently be rejected.
    ///
    /// Whitelisted clients are never blocked. An expired block is removed here.
    #[must_use]
    pub fn is_blocked(&self, client: &ClientId) -> bool {
        if self.is_whitelisted(client) {
            return false;
        }
        self.active_block(client).is_some()
    }

    /// Details of the client's active block, if any.
    #[must_use]
    pub fn block_info(&self, client: &ClientId) -> Option<BlockInfo> {
        if self.is_whitelisted(client) {
            return None;
        }
        let entry = self.active_block(client)?;
        let remaining = entry.unblock_at.saturating_sub(self.clock.now());
        Some(BlockInfo {
            unblock_at: entry.unblock_at.as_secs_f64(),
            remaining_secs: remaining.as_secs_f64(),
            reason: entry.reason,
            metrics: self.tracker.metrics(client),
        })
    }

    /// Current metrics for `client`; unknown clients report zeros.
    #[must_use]
    pub fn metrics(&self, client: &ClientId) -> ClientMetrics {
        self.tracker.metrics(client)
    }

    /// Events retained in the client's ledger.
    #[must_use]
    pub fn tracked_events(&self, client: &ClientId) -> usize {
        self.tracker.event_count(client)
    }

    #[must_use]
    pub fn status(&self, client: &ClientId) -> ClientStatus {
        let block = self.block_info(client);
        ClientStatus {
            client: client.clone(),
            whitelisted: self.is_whitelisted(client),
            blocked: block.is_some(),
            block,
            metrics: self.tracker.metrics(client),
        }
    }

    /// Exempt `client` from tracking and blocking, clearing any block.
    pub fn whitelist(&self, client: &ClientId) {
        self.whitelist.write().insert(client.clone());
        let cleared = self.blocks.remove(client).is_some();
        info!(client = %client, cleared_block = cleared, "Client whitelisted");
    }

    /// Returns `true` if the client was whitelisted.
    pub fn remove_from_whitelist(&self, client: &ClientId) -> bool {
        let removed = self.whitelist.write().remove(client);
        if removed {
            info!(client = %client, "Client removed from whitelist");
        }
        removed
    }

    #[must_use]
    pub fn is_whitelisted(&self, client: &ClientId) -> bool {
        self.whitelist.read().contains(client)
    }

    /// Block `client` regardless of its metrics.
    ///
    /// `None` or a zero duration applies the configured block duration.
    /// Returns the duration applied.
    pub fn manually_block(&self, client: &ClientId, duration: Option<Duration>) -> Duration {
        let duration = duration
            .filter(|d| !d.is_zero())
            .unwrap_or(self.block_duration);
        let unblock_at = self.clock.now().saturating_add(duration);
        self.blocks.insert(
            client.clone(),
            BlockEntry {
                unblock_at,
                reason: BlockReason::Manual,
            },
        );
        self.manual_blocks.fetch_add(1, Ordering::Relaxed);
        info!(client = %client, block_secs = duration.as_secs(), "Client manually blocked");
        duration
    }

    /// Lift any block on `client`. Returns `true` if one was active.
    pub fn manually_unblock(&self, client: &ClientId) -> bool {
        let removed = self.blocks.remove(client).is_some();
        if removed {
            info!(client = %client, "Client manually unblocked");
        }
        removed
    }

    #[must_use]
    pub fn stats(&self) -> DetectorStats {
        let now = self.clock.now();
        DetectorStats {
            tracked_clients: self.tracker.len(),
            blocked_clients: self
                .blocks
                .iter()
                .filter(|entry| entry.value().unblock_at > now)
                .count(),
            whitelisted_clients: self.whitelist.read().len(),
            automatic_blocks: self.automatic_blocks.load(Ordering::Relaxed),
            manual_blocks: self.manual_blocks.load(Ordering::Relaxed),
            ledger_sweeps: self.ledger_sweep.sweeps(),
        }
    }

    /// The client's block entry, removing it first if it has expired.
    fn active_block(&self, client: &ClientId) -> Option<BlockEntry> {
        let now = self.clock.now();
        let expired = self
            .blocks
            .remove_if(client, |_, entry| now >= entry.unblock_at);
        if let Some((_, entry)) = expired {
            info!(client = %client, reason = %entry.reason, "Block expired");
            return None;
        }
        self.blocks.get(client).map(|entry| *entry.value())
    }

    fn maybe_gc(&self) {
        if !self
            .ledger_sweep
            .try_claim(self.tracker.len(), self.clock.now())
        {
            return;
        }
        let evicted = self.tracker.gc(self.ledger_idle);
        let remaining = self.tracker.len();
        self.ledger_sweep.finish(remaining);
        debug!(evicted, remaining, "Evicted idle client ledgers");
    }
}
