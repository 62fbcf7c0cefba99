//! The snapshot sink interface.

use super::error::SinkResult;
use super::types::{BranchRecord, ReleaseRecord, SnapshotId, SnapshotTotals};
use crate::attribution::Attribution;

/// Destination for one export run.
///
/// A run calls `create_snapshot` once, then saves branches, releases and
/// commit batches under the returned id, then `complete_snapshot`. Any error
/// aborts the run.
pub trait SnapshotSink {
    /// Start a new snapshot for `repo_name`.
    fn create_snapshot(&mut self, repo_name: &str) -> SinkResult<SnapshotId>;

    fn save_branches(
        &mut self,
        repo_name: &str,
        snapshot: SnapshotId,
        branches: &[BranchRecord],
    ) -> SinkResult<()>;

    fn save_releases(
        &mut self,
        repo_name: &str,
        snapshot: SnapshotId,
        releases: &[ReleaseRecord],
    ) -> SinkResult<()>;

    /// Persist one attributed commit with its parent edges.
    fn save_commit(
        &mut self,
        repo_name: &str,
        snapshot: SnapshotId,
        commit: &Attribution,
    ) -> SinkResult<()>;

    /// Persist a batch of attributed commits.
    fn save_commits(
        &mut self,
        repo_name: &str,
        snapshot: SnapshotId,
        commits: &[Attribution],
    ) -> SinkResult<()> {
        for commit in commits {
            self.save_commit(repo_name, snapshot, commit)?;
        }
        Ok(())
    }

    /// Mark the snapshot finished.
    fn complete_snapshot(
        &mut self,
        _snapshot: SnapshotId,
        _totals: &SnapshotTotals,
    ) -> SinkResult<()> {
        Ok(())
    }
}
