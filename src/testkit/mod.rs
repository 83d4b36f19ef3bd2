//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`clock`] - `ManualClock`, a [`Clock`](crate::infrastructure::clock::Clock)
//!   that only moves when told to.
//! - [`factory`] - Fake pooled connections and a counting, switchable factory.
//! - [`config`] - Canonical test configurations (pool, abuse thresholds).

pub mod clock;
pub mod config;
pub mod factory;
