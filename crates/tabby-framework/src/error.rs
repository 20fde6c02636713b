//! Error types for the tabby framework.

use thiserror::Error;

/// Errors that can occur during context extraction.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The event is not of the kind the extractor asks for.
    #[error("event kind mismatch: expected '{expected}', got '{got}'")]
    EventKindMismatch {
        /// Expected kind.
        expected: &'static str,
        /// Actual `post_type`.
        got: String,
    },

    /// No value of the requested type is stored in the context.
    #[error("state '{0}' not found in context")]
    StateNotFound(&'static str),

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
