//! Collaborator error types.

use thiserror::Error;

/// Errors from content generators and image verifiers.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The request to the model failed.
    #[error("Generator request failed: {0}")]
    RequestFailed(String),

    /// Model output was not valid JSON.
    #[error("Failed to parse model response as JSON: {0}")]
    ParseError(String),

    /// Model output did not match the expected schema.
    #[error("Model output schema validation failed: {0}")]
    SchemaValidation(String),

    /// The request timed out.
    #[error("Generator request timed out after {0}ms")]
    Timeout(u64),

    /// The collaborator is unavailable.
    #[error("Generator unavailable: {0}")]
    Unavailable(String),

    /// Invalid request parameters.
    #[error("Invalid generator request: {0}")]
    InvalidRequest(String),
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::ParseError(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, LlmError>;
