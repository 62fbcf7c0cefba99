//! Export configuration: builder defaults plus an optional TOML file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::{ConfigError, ConfigResult};
use crate::catalog::ReleasePattern;
use crate::storage::default_repo_name;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "gitsnap.toml";

/// Options for one export run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Path to the repository (work tree or bare).
    pub repo_path: PathBuf,
    /// Name recorded with the snapshot. Derived from the path when unset.
    pub repo_name: Option<String>,
    /// Regex matched against short ref names; capture 1 is the component,
    /// capture 2 the version.
    pub release_pattern: String,
    /// Log every root and catalog decision.
    pub verbose: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("."),
            repo_name: None,
            release_pattern: ReleasePattern::DEFAULT.to_string(),
            verbose: false,
        }
    }
}

impl ExportConfig {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            ..Default::default()
        }
    }

    pub fn repo_name(mut self, name: impl Into<String>) -> Self {
        self.repo_name = Some(name.into());
        self
    }

    pub fn release_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.release_pattern = pattern.into();
        self
    }

    pub fn verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// The configured name, or the repository directory name without a
    /// trailing `.git`.
    pub fn resolved_name(&self) -> String {
        match &self.repo_name {
            Some(name) => name.clone(),
            None => default_repo_name(&self.repo_path),
        }
    }

    /// Start from the values of a config file.
    pub fn from_file(file: &FileConfig) -> Self {
        let mut config = Self::default();
        if let Some(path) = &file.repository {
            config.repo_path = path.clone();
        }
        config.repo_name = file.name.clone();
        if let Some(pattern) = &file.release_pattern {
            config.release_pattern = pattern.clone();
        }
        config
    }
}

/// Where a run writes its snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Sqlite,
    Jsonl,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkConfig {
    pub kind: SinkKind,
    /// Database file for sqlite, output file for jsonl (stdout if unset).
    pub path: Option<PathBuf>,
}

impl SinkConfig {
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: SinkKind::Sqlite,
            path: Some(path.into()),
        }
    }

    pub fn jsonl(path: Option<PathBuf>) -> Self {
        Self {
            kind: SinkKind::Jsonl,
            path,
        }
    }

    pub fn memory() -> Self {
        Self {
            kind: SinkKind::Memory,
            path: None,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.kind == SinkKind::Sqlite && self.path.is_none() {
            return Err(ConfigError::Invalid("sqlite sink needs a path".into()));
        }
        Ok(())
    }
}

/// Contents of `gitsnap.toml`. Every key is optional.
///
/// ```toml
/// repository = "target/checkout"
/// name = "mpo-ui"
/// release_pattern = '^(.+?)@([0-9.]+)$'
///
/// [sink]
/// kind = "sqlite"
/// path = "snapshots.db"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub repository: Option<PathBuf>,
    pub name: Option<String>,
    pub release_pattern: Option<String>,
    pub sink: Option<SinkConfig>,
}

impl FileConfig {
    /// Parse and validate TOML text. Relative paths are kept as written.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let config: FileConfig = toml::from_str(text)?;
        if let Some(sink) = &config.sink {
            sink.validate()?;
        }
        if let Some(pattern) = &config.release_pattern {
            ReleasePattern::new(pattern)
                .map_err(|e| ConfigError::Invalid(format!("release_pattern: {}", e)))?;
        }
        Ok(config)
    }

    /// Load a config file. Relative paths inside it resolve against the
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&text)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        if let Some(repository) = config.repository.take() {
            config.repository = Some(base.join(repository));
        }
        if let Some(sink) = config.sink.as_mut() {
            if let Some(sink_path) = sink.path.take() {
                sink.path = Some(base.join(sink_path));
            }
        }
        Ok(config)
    }

    /// Load `path` if it exists, else an empty config.
    pub fn load_optional(path: impl AsRef<Path>) -> ConfigResult<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
