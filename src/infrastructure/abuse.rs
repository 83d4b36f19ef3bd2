//! Request tracking, abuse detection and rate limiting.
//!
//! - [`RequestTracker`] keeps a sliding window of outcomes per client
//! - [`AbuseDetector`] judges those windows with the ordered
//!   [`ABUSE_POLICY`] and manages blocks and the whitelist
//! - [`RateLimiter`] enforces a fixed per-minute request budget
//!
//! Outcome codes follow HTTP: 200-399 succeed, 429 means throttled by the
//! rate limiter, any other 400-599 is a failure.

mod detector;
mod limiter;
mod policy;
mod sweep;
mod tracker;

pub use detector::{AbuseDetector, BlockInfo, ClientStatus, DetectorStats};
pub use limiter::{RateDecision, RateLimiter, RATE_WINDOW};
pub use policy::{evaluate, AbuseRule, AbuseThresholds, BlockReason, ABUSE_POLICY};
pub use tracker::{ClientLedger, ClientMetrics, RequestEvent, RequestTracker, THROTTLED_STATUS};
