//! Error types for sqlfrag

use std::error::Error as StdError;
use thiserror::Error;

/// Result type alias for sqlfrag operations
pub type FragResult<T> = Result<T, FragError>;

/// Error types for fragment construction, rendering and execution
#[derive(Debug, Error)]
pub enum FragError {
    /// Malformed text/argument interleaving or format string
    #[error("Template error: {0}")]
    Template(String),

    /// Low-level construction with a placeholder count that does not match the values
    #[error("Placeholder mismatch: {placeholders} placeholders, {values} values")]
    PlaceholderMismatch { placeholders: usize, values: usize },

    /// Identifier/literal escaping failed
    #[error("Escape error: {0}")]
    Escape(String),

    /// A deferred value asked for a call argument that was not supplied
    #[error("Missing call argument {index} (got {len})")]
    MissingArgument { index: usize, len: usize },

    /// A call argument exists but has a different type than requested
    #[error("Call argument {index} is not a `{expected}`")]
    ArgumentType { index: usize, expected: &'static str },

    /// A deferred value failed while being resolved
    #[error("Deferred value error: {0}")]
    Deferred(#[source] Box<dyn StdError + Send + Sync>),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),
}

impl FragError {
    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template(message.into())
    }

    /// Create an escape error
    pub fn escape(message: impl Into<String>) -> Self {
        Self::Escape(message.into())
    }

    /// Wrap a failure raised inside a deferred value.
    pub fn deferred(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Deferred(err.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
