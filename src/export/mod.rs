//! Export runs: configuration and the exporter that ties the catalog, the
//! attribution engine and a snapshot sink together.

mod api;
mod config;
mod error;

pub use api::{ExportSummary, Exporter};
pub use config::{ExportConfig, FileConfig, SinkConfig, SinkKind, DEFAULT_CONFIG_FILE};
pub use error::{ConfigError, ConfigResult, ExportError, ExportResult};
