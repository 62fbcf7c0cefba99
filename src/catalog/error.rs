//! Ref catalog errors.

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Ref catalog errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid release pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("release pattern '{0}' must have two capture groups (component, version)")]
    MissingCaptureGroups(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
