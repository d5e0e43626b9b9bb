//! Application-wide error types.

use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseSqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid state transition: cannot transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Email error: {0}")]
    Email(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether this error came from the persistence layer.
    ///
    /// A storage fault ends the current checking cycle; the next cycle starts fresh.
    pub fn is_storage_fault(&self) -> bool {
        matches!(
            self,
            Self::DatabaseSqlx(_) | Self::Migration(_) | Self::Database(_)
        )
    }

    /// Whether this error signals a broken caller invariant rather than a runtime condition.
    pub fn is_logic_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::InvalidStateTransition { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_fault_classification() {
        assert!(Error::DatabaseSqlx(sqlx::Error::PoolTimedOut).is_storage_fault());
        assert!(Error::Database("disk full".to_string()).is_storage_fault());
        assert!(!Error::config("bad").is_storage_fault());
        assert!(!Error::not_found("Posting", "abc").is_storage_fault());
    }

    #[test]
    fn test_logic_error_classification() {
        let err = Error::not_found("Posting", "abc");
        assert!(err.is_logic_error());
        assert_eq!(err.to_string(), "Entity not found: Posting with id abc");
    }
}
