//! Snapshot sink errors.

use thiserror::Error;

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Errors raised while persisting a snapshot. Any of these is fatal to the
/// run.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown snapshot: {0}")]
    UnknownSnapshot(String),

    #[error("invalid snapshot id: {0}")]
    InvalidSnapshotId(String),
}
