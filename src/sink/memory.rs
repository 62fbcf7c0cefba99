//! In-memory sink, used for dry runs and tests.

use chrono::{DateTime, Utc};

use super::error::{SinkError, SinkResult};
use super::traits::SnapshotSink;
use super::types::{BranchRecord, ReleaseRecord, SnapshotId, SnapshotTotals};
use crate::attribution::Attribution;

/// One snapshot held in memory.
#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    pub id: SnapshotId,
    pub repo_name: String,
    pub created_at: DateTime<Utc>,
    pub branches: Vec<BranchRecord>,
    pub releases: Vec<ReleaseRecord>,
    pub commits: Vec<Attribution>,
    /// Set once the snapshot completes.
    pub totals: Option<SnapshotTotals>,
}

impl MemorySnapshot {
    pub fn is_complete(&self) -> bool {
        self.totals.is_some()
    }

    /// The record for a commit, if this snapshot holds one.
    pub fn commit(&self, hash: &str) -> Option<&Attribution> {
        self.commits.iter().find(|a| a.commit.to_string() == hash)
    }
}

/// Keeps every snapshot it receives.
#[derive(Debug, Default)]
pub struct MemorySink {
    snapshots: Vec<MemorySnapshot>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> &[MemorySnapshot] {
        &self.snapshots
    }

    pub fn snapshot(&self, id: SnapshotId) -> Option<&MemorySnapshot> {
        self.snapshots.iter().find(|s| s.id == id)
    }

    /// The most recently created snapshot.
    pub fn latest(&self) -> Option<&MemorySnapshot> {
        self.snapshots.last()
    }

    fn snapshot_mut(&mut self, id: SnapshotId) -> SinkResult<&mut MemorySnapshot> {
        self.snapshots
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| SinkError::UnknownSnapshot(id.to_string()))
    }
}

impl SnapshotSink for MemorySink {
    fn create_snapshot(&mut self, repo_name: &str) -> SinkResult<SnapshotId> {
        let id = SnapshotId::generate();
        self.snapshots.push(MemorySnapshot {
            id,
            repo_name: repo_name.to_string(),
            created_at: Utc::now(),
            branches: Vec::new(),
            releases: Vec::new(),
            commits: Vec::new(),
            totals: None,
        });
        Ok(id)
    }

    fn save_branches(
        &mut self,
        _repo_name: &str,
        snapshot: SnapshotId,
        branches: &[BranchRecord],
    ) -> SinkResult<()> {
        self.snapshot_mut(snapshot)?
            .branches
            .extend_from_slice(branches);
        Ok(())
    }

    fn save_releases(
        &mut self,
        _repo_name: &str,
        snapshot: SnapshotId,
        releases: &[ReleaseRecord],
    ) -> SinkResult<()> {
        self.snapshot_mut(snapshot)?
            .releases
            .extend_from_slice(releases);
        Ok(())
    }

    fn save_commit(
        &mut self,
        _repo_name: &str,
        snapshot: SnapshotId,
        commit: &Attribution,
    ) -> SinkResult<()> {
        self.snapshot_mut(snapshot)?.commits.push(commit.clone());
        Ok(())
    }

    fn complete_snapshot(&mut self, snapshot: SnapshotId, totals: &SnapshotTotals) -> SinkResult<()> {
        self.snapshot_mut(snapshot)?.totals = Some(*totals);
        Ok(())
    }
}
