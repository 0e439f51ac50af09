//! Error types for deskmap.

use thiserror::Error;

use crate::validate::ValidationReport;

/// Result type alias using deskmap's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for deskmap operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Floor plan not found (or not visible to the requesting actor)
    #[error("Floor plan not found: {0}")]
    FloorPlanNotFound(uuid::Uuid),

    /// Location not found
    #[error("Location not found: {0}")]
    LocationNotFound(uuid::Uuid),

    /// One or more submitted fields failed validation; nothing was applied
    #[error("Validation failed")]
    Validation(ValidationReport),

    /// Authentication required or token invalid
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted (non-owner write)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Image/storage backend call failed; not retried
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<ValidationReport> for Error {
    fn from(report: ValidationReport) -> Self {
        Error::Validation(report)
    }
}
