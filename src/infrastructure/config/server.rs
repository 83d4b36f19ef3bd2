//! HTTP server and database location configuration.

use serde::Deserialize;

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:5001`.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Use the first `X-Forwarded-For` entry as the client identity.
    ///
    /// Only enable behind a proxy that overwrites the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,
    /// Mount the `/admin` routes.
    #[serde(default = "default_admin_enabled")]
    pub admin_enabled: bool,
}

fn default_bind() -> String {
    "0.0.0.0:5001".into()
}

const fn default_admin_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            trust_forwarded_for: false,
            admin_enabled: default_admin_enabled(),
        }
    }
}

/// SQLite database file and per-connection tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the database file, or `:memory:`.
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_journal_mode")]
    pub journal_mode: String,
    #[serde(default = "default_synchronous")]
    pub synchronous: String,
    /// Page cache size per connection (KiB).
    #[serde(default = "default_cache_size_kib")]
    pub cache_size_kib: u32,
}

fn default_database_url() -> String {
    "./data/app.db".into()
}

const fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_journal_mode() -> String {
    "WAL".into()
}

fn default_synchronous() -> String {
    "NORMAL".into()
}

const fn default_cache_size_kib() -> u32 {
    65_536
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: default_journal_mode(),
            synchronous: default_synchronous(),
            cache_size_kib: default_cache_size_kib(),
        }
    }
}
