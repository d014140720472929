//! Error types for the index crate.

use thiserror::Error;

/// Errors that can occur in the index crate.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Database connection or operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Embedding dimensionality did not match the index.
    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    Dimensions { expected: usize, actual: usize },

    /// Invalid data or state.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
