//! Persistence port for warrior records.
//!
//! Implementations are blocking: each call borrows a database handle for its
//! duration. Async callers run them on a blocking thread.

use crate::domain::{NewWarrior, Warrior, WarriorId};
use crate::error::Result;

/// Storage operations for warriors.
pub trait WarriorStore: Send + Sync {
    /// Insert a new warrior and return the stored record.
    fn create(&self, warrior: NewWarrior) -> Result<Warrior>;

    /// Get a warrior by ID.
    fn get(&self, id: &WarriorId) -> Result<Option<Warrior>>;

    /// Search warriors by name, birth date text, or fight skill.
    fn search(&self, term: &str, limit: usize) -> Result<Vec<Warrior>>;

    /// Count all stored warriors.
    fn count(&self) -> Result<u64>;

    /// Round-trip a trivial query to prove the backend is reachable.
    fn ping(&self) -> Result<()>;
}
