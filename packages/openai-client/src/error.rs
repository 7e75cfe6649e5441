//! Error types for the OpenAI client.

use thiserror::Error;

/// Result type for OpenAI client operations.
pub type Result<T> = std::result::Result<T, OpenAIError>;

/// Failures surfaced by the OpenAI client.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// Missing or invalid client configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection failed or timed out before a response arrived
    #[error("network error: {0}")]
    Network(String),

    /// The API returned a non-2xx status (rate limit, auth, bad request)
    #[error("API error: {0}")]
    Api(String),

    /// The response body was not in the expected shape
    #[error("parse error: {0}")]
    Parse(String),
}
