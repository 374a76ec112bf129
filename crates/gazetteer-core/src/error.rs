//! Error types for the Gazetteer core engine.
//!
//! This module provides error handling for parsing support, candidate recall,
//! scoring, judging, and clustering operations.

use thiserror::Error;

/// The main error type for Gazetteer core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration file could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Alias map file could not be read or parsed
    #[error("alias map error: {0}")]
    AliasMap(String),

    /// A collaborator (repository or parser) returned an unexpected error
    #[error("collaborator error: {0}")]
    Collaborator(String),

    /// A grid-search or evaluation request was malformed
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// I/O error reading a data file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),
}

/// A specialized Result type for Gazetteer core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::Config("missing db_path".to_string());
        assert_eq!(err.to_string(), "configuration error: missing db_path");
    }

    #[test]
    fn error_from_json() {
        let bad: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: CoreError = bad.unwrap_err().into();
        assert!(matches!(err, CoreError::Json(_)));
    }
}
