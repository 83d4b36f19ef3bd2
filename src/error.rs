use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Connection pool errors.
///
/// `Exhausted` and `ConnectionCreateFailed` are transient overload conditions;
/// callers are expected to surface them as "service unavailable".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("connection pool exhausted ({max_connections} connections in use)")]
    Exhausted { max_connections: usize },

    #[error("failed to create connection: {0}")]
    ConnectionCreateFailed(String),

    #[error("connection pool is closed")]
    Closed,
}

impl PoolError {
    /// Whether the error reflects temporary overload rather than a fatal state.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Exhausted { .. } | Self::ConnectionCreateFailed(_)
        )
    }
}

/// Warrior record validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Request body must be JSON")]
    NotJson,

    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    #[error("Field '{field}' {reason}")]
    InvalidField { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("migration error: {0}")]
    Migration(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl From<diesel::ConnectionError> for Error {
    fn from(err: diesel::ConnectionError) -> Self {
        Error::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_classify_transient() {
        assert!(PoolError::Exhausted { max_connections: 4 }.is_transient());
        assert!(PoolError::ConnectionCreateFailed("refused".into()).is_transient());
        assert!(!PoolError::Closed.is_transient());
    }

    #[test]
    fn validation_messages_match_api_wording() {
        assert_eq!(
            ValidationError::MissingField("name").to_string(),
            "Field 'name' is required"
        );
        assert_eq!(
            ValidationError::InvalidField {
                field: "fight_skills",
                reason: "must be a list".into(),
            }
            .to_string(),
            "Field 'fight_skills' must be a list"
        );
    }

    #[test]
    fn pool_error_converts_into_crate_error() {
        let err: Error = PoolError::Closed.into();
        assert!(matches!(err, Error::Pool(PoolError::Closed)));
    }
}
