//! Database error types for the Gazetteer persistence layer.

use thiserror::Error;

/// Errors surfaced by the SQLite-backed repository.
#[derive(Error, Debug)]
pub enum DbError {
    /// SQL execution error
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    MigrationError(String),

    /// Connection pool error
    #[error("connection pool error: {0}")]
    PoolError(String),

    /// A row could not be decoded into its domain struct (malformed JSON
    /// column, unexpected value, etc).
    #[error("row decode error: {0}")]
    Decode(String),

    /// Requested resource not found
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error
    #[error("database error: {0}")]
    Generic(String),
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Whether this error represents a connectivity problem rather than a
    /// data problem.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, DbError::PoolError(_) | DbError::SqlError(_))
    }
}

impl From<DbError> for gazetteer_core::error::CoreError {
    fn from(err: DbError) -> Self {
        gazetteer_core::error::CoreError::Collaborator(err.to_string())
    }
}
