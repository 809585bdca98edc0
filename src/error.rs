//! Error types for docshelf
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using ShelfError
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Unified error type for docshelf operations
#[derive(Debug, Error)]
pub enum ShelfError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Argument Errors (raised before any I/O)
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Update Operator Errors
    // -------------------------------------------------------------------------
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Unsupported update operator: {0}")]
    UnsupportedOperator(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Lock error: {0}")]
    Lock(String),

    // -------------------------------------------------------------------------
    // Setup Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Startup failed: {0}")]
    Startup(String),
}

impl ShelfError {
    /// Shorthand for an `InvalidArgument` error
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ShelfError::InvalidArgument(message.into())
    }
}
