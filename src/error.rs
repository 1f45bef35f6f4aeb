//! Error types for rubric
//!
//! Centralized error handling using thiserror. LLM call faults have their own
//! `LlmError` type next to the client trait; this enum covers everything the
//! rest of the crate can fail with.

use thiserror::Error;

/// All error types that can occur in rubric
#[derive(Debug, Error)]
pub enum RubricError {
    /// Missing or invalid client configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Prompt template error
    #[error("Template error: {0}")]
    Template(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for rubric operations
pub type Result<T> = std::result::Result<T, RubricError>;
