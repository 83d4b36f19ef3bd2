//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity a request is attributed to for abuse tracking.
///
/// Usually the remote IP address. The core treats it as an opaque key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    /// Placeholder identity used when the transport exposes no peer address.
    pub const UNKNOWN: &'static str = "unknown";

    /// Create a new `ClientId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the client ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Warrior record identifier (UUID v4, hyphenated lowercase).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarriorId(String);

impl WarriorId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse an identifier supplied by a caller.
    ///
    /// Returns `None` when the input is not a UUID; such ids can never match a
    /// stored record.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw)
            .ok()
            .map(|uuid| Self(uuid.hyphenated().to_string()))
    }

    /// Get the warrior ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WarriorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
