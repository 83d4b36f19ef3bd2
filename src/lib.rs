//! Warband - warrior registry service with a self-healing connection pool and
//! adaptive abuse detection.
//!
//! # Architecture
//!
//! The crate is laid out hexagonally:
//!
//! - **`domain`** - Warrior records and identities, free of storage concerns
//! - **`port`** - The [`WarriorStore`](port::WarriorStore) persistence seam
//! - **`infrastructure`** - Connection pool, abuse detection, configuration,
//!   health reporting and the composition root
//! - **`adapter`** - SQLite store (outbound), HTTP server and CLI (inbound)
//!
//! # Request path
//!
//! Every request is attributed to a client identity. Blocked clients are
//! turned away with `403` before anything else runs, over-budget clients get
//! `429`, and the final status of everything else is fed back into the
//! abuse detector. Handlers borrow one pooled database handle per query.
//!
//! # Example
//!
//! ```no_run
//! use warband::infrastructure::bootstrap::AppContext;
//! use warband::infrastructure::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     let ctx = AppContext::build(config)?;
//!     ctx.migrate()?;
//!     println!("{:?}", ctx.stats().pool);
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

/// Shared test utilities (test builds or `testkit` feature only).
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
