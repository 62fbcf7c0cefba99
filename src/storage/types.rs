//! core type-safe wrappers around git primitives for the storage layer.

use std::fmt;
use std::fmt::Formatter;

use git2::Oid;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// This makes sure we don't accidentally pass a tag or tree ID where a commit ID
/// is expected. The inner Oid is only accessible within the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId(pub(crate) Oid);

impl CommitId {
    pub(crate) fn new(oid: Oid) -> Self {
        Self(oid)
    }

    /// raw Oid (for internal use only)
    pub(crate) fn raw(&self) -> Oid {
        self.0
    }

    /// parse CommitId from a hex string
    pub fn from_hex(hex: &str) -> Result<Self, git2::Error> {
        Oid::from_str(hex).map(CommitId)
    }

    /// short form of the commit ID
    pub fn short(&self) -> String {
        self.0.to_string()[..7].to_string()
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for CommitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CommitId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        CommitId::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// The two ref namespaces an export reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefNamespace {
    /// `refs/heads/`
    Heads,
    /// `refs/tags/`
    Tags,
}

impl RefNamespace {
    pub const ALL: [RefNamespace; 2] = [RefNamespace::Heads, RefNamespace::Tags];

    /// the full prefix, including the trailing slash
    pub fn prefix(&self) -> &'static str {
        match self {
            RefNamespace::Heads => "refs/heads/",
            RefNamespace::Tags => "refs/tags/",
        }
    }

    /// namespace of a full ref name, if it is one we read
    pub fn of(full_name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ns| full_name.starts_with(ns.prefix()))
    }
}

/// A ref pinned to the commit it pointed at when it was listed.
///
/// `name` is always the full ref name (`refs/tags/v1@1.0`). Annotated tags
/// are peeled, so `target` names a commit whenever the ref is healthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefEntry {
    pub name: String,
    pub target: CommitId,
}

impl RefEntry {
    /// create a new RefEntry, validating the ref name
    pub fn new(name: impl Into<String>, target: CommitId) -> Result<Self, InvalidNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self { name, target })
    }

    fn validate(name: &str) -> Result<(), InvalidNameError> {
        if name.is_empty() {
            return Err(InvalidNameError::Empty);
        }
        if !name.starts_with("refs/") {
            return Err(InvalidNameError::NotQualified(name.to_string()));
        }
        if name.contains("..") || name.ends_with('/') {
            return Err(InvalidNameError::InvalidPath(name.to_string()));
        }
        Ok(())
    }

    /// namespace this ref lives in
    pub fn namespace(&self) -> Option<RefNamespace> {
        RefNamespace::of(&self.name)
    }

    /// the name without its namespace prefix (`main`, `v1@1.0`)
    pub fn short_name(&self) -> &str {
        match self.namespace() {
            Some(ns) => &self.name[ns.prefix().len()..],
            None => self.name.strip_prefix("refs/").unwrap_or(&self.name),
        }
    }

    /// check if this is a branch head
    pub fn is_branch(&self) -> bool {
        self.namespace() == Some(RefNamespace::Heads)
    }
}

impl fmt::Display for RefEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.name, self.target.short())
    }
}

/// error type for invalid ref names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidNameError {
    Empty,
    NotQualified(String),
    InvalidPath(String),
}

impl fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "name cannot be empty"),
            Self::NotQualified(name) => write!(f, "'{}' is not a fully qualified ref name", name),
            Self::InvalidPath(path) => write!(f, "invalid path: '{}'", path),
        }
    }
}

impl std::error::Error for InvalidNameError {}
