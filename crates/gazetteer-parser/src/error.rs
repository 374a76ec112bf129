//! Error types for the remote parser and LLM judge client.

use thiserror::Error;

/// Errors surfaced by the OpenAI-compatible parser/arbitrator client.
#[derive(Error, Debug)]
pub enum ParserError {
    /// `OPENAI_API_KEY` was not set.
    #[error("OPENAI_API_KEY is not set, cannot call the remote parser")]
    MissingApiKey,

    /// The HTTP call itself failed (connection, timeout, non-2xx, ...).
    #[error("request to the parser endpoint failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body was not valid JSON, or not the shape expected.
    #[error("malformed response from parser endpoint: {0}")]
    MalformedResponse(String),
}

/// Result type alias for parser-client operations.
pub type ParserResult<T> = std::result::Result<T, ParserError>;

impl From<ParserError> for gazetteer_core::error::CoreError {
    fn from(err: ParserError) -> Self {
        gazetteer_core::error::CoreError::Collaborator(err.to_string())
    }
}
