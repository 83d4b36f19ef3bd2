//! HTTP surface built on axum.
//!
//! Warrior routes and the catch-all 404 sit behind [`guard::abuse_guard`].
//! Health and admin routes are mounted beside them, untracked.

pub mod admin;
pub mod client;
pub mod error;
pub mod guard;
pub mod router;
pub mod server;
pub mod warrior;

pub use error::ApiError;
pub use router::build_router;
pub use server::serve;
