//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without containing
//! business logic. This layer handles configuration, connection management,
//! request accounting and runtime wiring.
//!
//! # Submodules
//!
//! - [`abuse`] - Request tracking, abuse detection and rate limiting
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`clock`] - Injectable wall clock
//! - [`config`] - Configuration loading and validation
//! - [`health`] - Readiness probe and service statistics
//! - [`pool`] - Bounded, self-healing connection pool

pub mod abuse;
pub mod bootstrap;
pub mod clock;
pub mod config;
pub mod health;
pub mod pool;
