//! SQLite persistence adapter.
//!
//! Provides the pooled connection factory, migrations, and the
//! [`WarriorStore`](crate::port::WarriorStore) implementation using Diesel ORM.

pub mod database;
pub mod store;

pub use store::SqliteWarriorStore;
