//! Error types for murmur-core

use thiserror::Error;

use crate::models::RecordId;
use crate::store::StoreError;

/// Result type alias using murmur-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in murmur-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote document store error (transport, auth, or unexpected API response)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A save still conflicted after its single reconciliation pass
    #[error("Save of {0} conflicted again after reconciling; reload and retry")]
    UnresolvedConflict(String),

    /// Record not found
    #[error("Record not found: #{0}")]
    NotFound(RecordId),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Admin credentials missing or rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
