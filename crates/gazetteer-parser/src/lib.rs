//! Remote address structuring and LLM judge tiebreak for the Gazetteer
//! address resolution engine, as an OpenAI-compatible chat-completions
//! client.

pub mod error;
pub mod openai;

pub use error::{ParserError, ParserResult};
pub use openai::OpenAiClient;
