//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!        ┌──────────────┐        ┌──────────────┐
//!  HTTP ─┤ inbound      │        │ outbound     ├─ SQLite
//!        │ adapter      ├─ port ─┤ adapter      │
//!        └──────────────┘        └──────────────┘
//! ```

pub mod outbound;

pub use outbound::store::WarriorStore;
