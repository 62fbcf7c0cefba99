//! Export and configuration errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::sink::SinkError;
use crate::storage::StorageError;

/// Result type for export runs.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Fatal export failures. Recoverable problems are reported as anomalies in
/// the summary instead.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
