//! Error types and JSON error responses for the comparison API.

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Main error type for the Gazetteer server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A collaborator (pipeline, repository, parser) returned an error.
    #[error("collaborator error: {0}")]
    Collaborator(String),

    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed or otherwise invalid request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// I/O errors.
    #[error("I/O error: {0}")]
    IoError(String),
}

/// JSON error response structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ServerError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Collaborator(_) => StatusCode::BAD_GATEWAY,
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::Configuration(_) => "CONFIGURATION_ERROR",
            ServerError::Collaborator(_) => "COLLABORATOR_ERROR",
            ServerError::Validation(_) => "VALIDATION_ERROR",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::IoError(_) => "IO_ERROR",
        }
    }

    fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_response();

        if status.is_server_error() {
            tracing::error!("server error: {self}");
        } else {
            tracing::debug!("client error: {self}");
        }

        (status, Json(body)).into_response()
    }
}

impl From<gazetteer_core::error::CoreError> for ServerError {
    fn from(err: gazetteer_core::error::CoreError) -> Self {
        ServerError::Collaborator(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ServerError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServerError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ServerError::BadRequest("x".to_string()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::Collaborator("x".to_string()).status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ServerError::Validation("x".to_string()).error_code(), "VALIDATION_ERROR");
    }
}
