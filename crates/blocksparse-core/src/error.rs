//! Error types for block-sparse matrix multiplication
//!
//! Provides a unified error type for all blocksparse crates.

use thiserror::Error;

/// Core error type for block-sparse operations
#[derive(Error, Debug)]
pub enum Error {
    /// Operand dimensions disagree with each other or with the tile grid
    #[error("Shape mismatch in {context}: {detail}")]
    ShapeMismatch { context: String, detail: String },

    /// Lookup table or coordinate list violates its invariants
    #[error("Invalid tile index: {0}")]
    InvalidTileIndex(String),

    /// Mode selector names no kernel
    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),

    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Threading or parallelization error
    #[error("Execution error: {0}")]
    Execution(String),

    /// Configuration or layout (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(context: &str, detail: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            context: context.to_string(),
            detail: detail.into(),
        }
    }

    /// Create an error for a dimension that differs from the expected value
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::shape_mismatch(context, format!("expected {expected}, got {actual}"))
    }

    /// Create an error for a malformed tile index
    pub fn invalid_tile_index(detail: impl Into<String>) -> Self {
        Self::InvalidTileIndex(detail.into())
    }
}
