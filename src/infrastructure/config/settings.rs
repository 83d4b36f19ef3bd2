//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; every section has defaults, so an
//! empty file is a valid configuration. `WARBAND_DATABASE_URL` overrides the
//! database location.
//!
//! # Example
//!
//! ```no_run
//! use warband::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use super::abuse::{AbuseConfig, RateLimitConfig};
use super::logging::LoggingConfig;
use super::pool::PoolConfig;
use super::server::{DatabaseConfig, ServerConfig};
use crate::error::{ConfigError, Result};

/// Environment variable that overrides `[database].url`.
pub const DATABASE_URL_ENV: &str = "WARBAND_DATABASE_URL";

const JOURNAL_MODES: [&str; 6] = ["DELETE", "TRUNCATE", "PERSIST", "MEMORY", "WAL", "OFF"];
const SYNCHRONOUS_MODES: [&str; 4] = ["OFF", "NORMAL", "FULL", "EXTRA"];

/// Longest automatic block the service accepts, one year.
pub const MAX_BLOCK_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub abuse: AbuseConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML text and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.database.url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Initialize logging from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns an error if `server.bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind.parse().map_err(|_| {
            ConfigError::InvalidValue {
                field: "bind",
                reason: format!("'{}' is not a socket address", self.server.bind),
            }
            .into()
        })
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are present and values are within
    /// acceptable ranges.
    fn validate(&self) -> Result<()> {
        let invalid = |field: &'static str, reason: &str| -> crate::error::Error {
            ConfigError::InvalidValue {
                field,
                reason: reason.to_string(),
            }
            .into()
        };

        self.bind_addr()?;
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "url" }.into());
        }
        if !JOURNAL_MODES.contains(&self.database.journal_mode.to_ascii_uppercase().as_str()) {
            return Err(invalid("journal_mode", "must be a SQLite journal mode"));
        }
        if !SYNCHRONOUS_MODES.contains(&self.database.synchronous.to_ascii_uppercase().as_str()) {
            return Err(invalid("synchronous", "must be OFF, NORMAL, FULL or EXTRA"));
        }
        if self.pool.max_connections == 0 {
            return Err(invalid("max_connections", "must be > 0"));
        }
        if self.pool.initial_size > self.pool.max_connections {
            return Err(invalid("initial_size", "must be <= max_connections"));
        }
        if self.abuse.window_secs == 0 {
            return Err(invalid("window_secs", "must be > 0"));
        }
        if self.abuse.block_duration_secs == 0 {
            return Err(invalid("block_duration_secs", "must be > 0"));
        }
        if self.abuse.block_duration_secs > MAX_BLOCK_DURATION_SECS {
            return Err(invalid("block_duration_secs", "must be <= one year"));
        }
        if !(0.0..=100.0).contains(&self.abuse.max_failure_rate) {
            return Err(invalid("max_failure_rate", "must be between 0 and 100"));
        }
        if !(0.0..=100.0).contains(&self.abuse.max_rate_limit_rate) {
            return Err(invalid("max_rate_limit_rate", "must be between 0 and 100"));
        }
        if self.abuse.max_tracked_clients == 0 {
            return Err(invalid("max_tracked_clients", "must be > 0"));
        }
        if self.rate_limit.requests_per_minute == 0 {
            return Err(invalid("requests_per_minute", "must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:5001");
        assert_eq!(config.pool.initial_size, 20);
        assert_eq!(config.pool.max_connections, 40);
        assert_eq!(config.abuse.window_secs, 60);
        assert_eq!(config.abuse.max_requests_per_minute, 200);
        assert_eq!(config.abuse.min_requests_for_abuse, 20);
        assert_eq!(config.rate_limit.requests_per_minute, 100);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn sections_override_defaults() {
        let toml = r#"
            [pool]
            initial_size = 2
            max_connections = 4

            [abuse]
            window_secs = 30
            whitelist = ["127.0.0.1"]

            [logging]
            format = "json"
        "#;
        let config = Config::parse_toml(toml).unwrap();
        assert_eq!(config.pool.initial_size, 2);
        assert_eq!(config.pool.max_connections, 4);
        assert_eq!(config.abuse.window_secs, 30);
        assert_eq!(config.abuse.whitelist, vec!["127.0.0.1".to_string()]);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn rejects_initial_size_above_max() {
        let toml = "[pool]\ninitial_size = 10\nmax_connections = 5\n";
        let err = Config::parse_toml(toml).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "initial_size",
                ..
            })
        ));
    }

    #[test]
    fn rejects_block_duration_above_one_year() {
        let toml = format!(
            "[abuse]\nblock_duration_secs = {}\n",
            MAX_BLOCK_DURATION_SECS + 1
        );
        let err = Config::parse_toml(&toml).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "block_duration_secs",
                ..
            })
        ));

        let toml = format!("[abuse]\nblock_duration_secs = {MAX_BLOCK_DURATION_SECS}\n");
        assert!(Config::parse_toml(&toml).is_ok());
    }

    #[test]
    fn rejects_zero_max_connections() {
        let toml = "[pool]\ninitial_size = 0\nmax_connections = 0\n";
        assert!(Config::parse_toml(toml).is_err());
    }

    #[test]
    fn rejects_out_of_range_percentages() {
        assert!(Config::parse_toml("[abuse]\nmax_failure_rate = 120.0\n").is_err());
        assert!(Config::parse_toml("[abuse]\nmax_rate_limit_rate = -1.0\n").is_err());
    }

    #[test]
    fn rejects_unknown_sqlite_modes() {
        assert!(Config::parse_toml("[database]\njournal_mode = \"wal; DROP TABLE warrior\"\n").is_err());
        assert!(Config::parse_toml("[database]\nsynchronous = \"sometimes\"\n").is_err());
        assert!(Config::parse_toml("[database]\njournal_mode = \"delete\"\n").is_ok());
    }

    #[test]
    fn rejects_bad_bind_address() {
        let err = Config::parse_toml("[server]\nbind = \"not-an-addr\"\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { field: "bind", .. })
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            Config::parse_toml("[pool"),
            Err(Error::Config(ConfigError::Parse(_)))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(matches!(
            Config::load("/definitely/not/here/config.toml"),
            Err(Error::Config(ConfigError::ReadFile(_)))
        ));
    }
}
