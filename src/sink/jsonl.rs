//! JSON-lines snapshot sink.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use super::error::{SinkError, SinkResult};
use super::traits::SnapshotSink;
use super::types::{BranchRecord, ReleaseRecord, SnapshotId, SnapshotTotals};
use crate::attribution::Attribution;
use crate::storage::CommitId;

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Line<'a> {
    Snapshot {
        snapshot_id: SnapshotId,
        repo_name: &'a str,
        created_at: DateTime<Utc>,
    },
    Branch {
        snapshot_id: SnapshotId,
        repo_name: &'a str,
        name: &'a str,
        commit: CommitId,
    },
    Release {
        snapshot_id: SnapshotId,
        repo_name: &'a str,
        name: &'a str,
        component: &'a str,
        version: &'a str,
        timestamp: Option<DateTime<FixedOffset>>,
        commit: CommitId,
    },
    Commit {
        snapshot_id: SnapshotId,
        repo_name: &'a str,
        commit: CommitId,
        authored_at: Option<DateTime<FixedOffset>>,
        claimed_by: &'a str,
        release_timestamp: Option<DateTime<FixedOffset>>,
        parents: &'a [CommitId],
    },
    Complete {
        snapshot_id: SnapshotId,
        completed_at: DateTime<Utc>,
        totals: &'a SnapshotTotals,
    },
}

/// Writes one JSON object per record, each tagged with `"kind"`.
pub struct JsonLinesSink<W: Write> {
    out: W,
    snapshots: HashSet<SnapshotId>,
}

impl JsonLinesSink<BufWriter<File>> {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> SinkResult<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl JsonLinesSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            snapshots: HashSet::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &Line<'_>) -> SinkResult<()> {
        serde_json::to_writer(&mut self.out, line)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn check(&self, snapshot: SnapshotId) -> SinkResult<()> {
        if self.snapshots.contains(&snapshot) {
            Ok(())
        } else {
            Err(SinkError::UnknownSnapshot(snapshot.to_string()))
        }
    }
}

impl<W: Write> SnapshotSink for JsonLinesSink<W> {
    fn create_snapshot(&mut self, repo_name: &str) -> SinkResult<SnapshotId> {
        let snapshot_id = SnapshotId::generate();
        self.write_line(&Line::Snapshot {
            snapshot_id,
            repo_name,
            created_at: Utc::now(),
        })?;
        self.snapshots.insert(snapshot_id);
        Ok(snapshot_id)
    }

    fn save_branches(
        &mut self,
        repo_name: &str,
        snapshot: SnapshotId,
        branches: &[BranchRecord],
    ) -> SinkResult<()> {
        self.check(snapshot)?;
        for branch in branches {
            self.write_line(&Line::Branch {
                snapshot_id: snapshot,
                repo_name,
                name: &branch.name,
                commit: branch.commit,
            })?;
        }
        Ok(())
    }

    fn save_releases(
        &mut self,
        repo_name: &str,
        snapshot: SnapshotId,
        releases: &[ReleaseRecord],
    ) -> SinkResult<()> {
        self.check(snapshot)?;
        for release in releases {
            self.write_line(&Line::Release {
                snapshot_id: snapshot,
                repo_name,
                name: &release.name,
                component: &release.component,
                version: &release.version,
                timestamp: release.timestamp,
                commit: release.commit,
            })?;
        }
        Ok(())
    }

    fn save_commit(
        &mut self,
        repo_name: &str,
        snapshot: SnapshotId,
        commit: &Attribution,
    ) -> SinkResult<()> {
        self.check(snapshot)?;
        self.write_line(&Line::Commit {
            snapshot_id: snapshot,
            repo_name,
            commit: commit.commit,
            authored_at: commit.authored_at,
            claimed_by: &commit.claimed_by,
            release_timestamp: commit.release_timestamp,
            parents: &commit.parents,
        })
    }

    fn complete_snapshot(&mut self, snapshot: SnapshotId, totals: &SnapshotTotals) -> SinkResult<()> {
        self.check(snapshot)?;
        self.write_line(&Line::Complete {
            snapshot_id: snapshot,
            completed_at: Utc::now(),
            totals,
        })?;
        self.out.flush()?;
        Ok(())
    }
}
