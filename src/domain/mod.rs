//! Storage-agnostic domain types.

pub mod id;
pub mod warrior;

pub use id::{ClientId, WarriorId};
pub use warrior::{NewWarrior, Warrior};
