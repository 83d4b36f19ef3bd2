//! SQLite database modules.
//!
//! Provides the connection factory, migration support, schema definitions,
//! and Diesel row types for warrior persistence.

pub mod connection;
pub mod model;
pub mod schema;
