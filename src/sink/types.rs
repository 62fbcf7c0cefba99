//! Snapshot identifiers and persisted record shapes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ulid::Ulid;

use super::error::SinkError;
use crate::catalog::{Branch, Release};
use crate::storage::CommitId;

/// Identifier of one export run. Rendered as a lower-case ULID, so ids sort
/// by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotId(Ulid);

impl SnapshotId {
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    pub fn ulid(&self) -> Ulid {
        self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string().to_lowercase())
    }
}

impl FromStr for SnapshotId {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s)
            .map(SnapshotId)
            .map_err(|_| SinkError::InvalidSnapshotId(s.to_string()))
    }
}

impl Serialize for SnapshotId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SnapshotId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A branch as persisted: full ref name and the commit it pointed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRecord {
    pub name: String,
    pub commit: CommitId,
}

impl From<&Branch> for BranchRecord {
    fn from(branch: &Branch) -> Self {
        Self {
            name: branch.name().to_string(),
            commit: branch.target(),
        }
    }
}

/// A release as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub name: String,
    pub component: String,
    pub version: String,
    /// Authorship time of the release's commit, None when it could not be
    /// determined.
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub commit: CommitId,
}

impl From<&Release> for ReleaseRecord {
    fn from(release: &Release) -> Self {
        Self {
            name: release.name().to_string(),
            component: release.component.clone(),
            version: release.version.clone(),
            timestamp: release.timestamp,
            commit: release.target(),
        }
    }
}

/// Final counts written when a snapshot completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotTotals {
    pub branches: usize,
    pub releases: usize,
    pub commits: usize,
    pub anomalies: usize,
    pub skipped_roots: usize,
}
