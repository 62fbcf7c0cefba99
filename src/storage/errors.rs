//! Storage layer error types
//!
//! All errors that can occur while reading a repository are defined here.
//! We use `thiserror` for ergonomic error definition and better error messages

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::types::InvalidNameError;

/// the main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// error from the underlying Git library
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// the specified ref was not found or does not peel to a commit
    #[error("ref not found: {0}")]
    RefNotFound(String),

    /// the commit was not found (dangling id or corrupt object)
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    /// a ref name that cannot be used
    #[error("invalid ref name: {0}")]
    InvalidRefName(#[from] InvalidNameError),

    /// repo could not be opened
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    /// internal error that shouldn't happen
    #[error("internal error: {0}")]
    Internal(String),
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
