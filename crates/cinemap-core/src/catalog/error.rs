//! Catalog error types

use thiserror::Error;

/// Errors that can occur while talking to the catalog/feedback store
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// Invalid item or feedback data
    #[error("invalid catalog data: {0}")]
    InvalidData(String),

    /// Embedding length differs from the catalog's dimension
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Storage backend error (database, filesystem, etc.)
    #[error("catalog backend error: {0}")]
    Backend(String),
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
