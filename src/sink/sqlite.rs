//! SQLite-backed snapshot sink.

use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::{params, Connection, Transaction};
use tracing::debug;

use super::error::{SinkError, SinkResult};
use super::schema::SCHEMA;
use super::traits::SnapshotSink;
use super::types::{BranchRecord, ReleaseRecord, SnapshotId, SnapshotTotals};
use crate::attribution::Attribution;

/// Writes snapshots into a SQLite database. Every batch is one transaction.
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> SinkResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened sqlite sink");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> SinkResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> SinkResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Check that the connection answers.
    pub fn ping(&self) -> SinkResult<()> {
        self.conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn begin(&mut self, snapshot: SnapshotId) -> SinkResult<Transaction<'_>> {
        let tx = self.conn.transaction()?;
        let known: i64 = tx.query_row(
            "SELECT COUNT(*) FROM snapshots WHERE snapshot_id = ?1",
            params![snapshot.to_string()],
            |row| row.get(0),
        )?;
        if known == 0 {
            return Err(SinkError::UnknownSnapshot(snapshot.to_string()));
        }
        Ok(tx)
    }
}

fn rfc3339(ts: Option<DateTime<FixedOffset>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339())
}

impl SnapshotSink for SqliteSink {
    fn create_snapshot(&mut self, repo_name: &str) -> SinkResult<SnapshotId> {
        let id = SnapshotId::generate();
        self.conn.execute(
            "INSERT INTO snapshots (snapshot_id, repo_name, created_at) VALUES (?1, ?2, ?3)",
            params![id.to_string(), repo_name, Utc::now().to_rfc3339()],
        )?;
        Ok(id)
    }

    fn save_branches(
        &mut self,
        repo_name: &str,
        snapshot: SnapshotId,
        branches: &[BranchRecord],
    ) -> SinkResult<()> {
        let tx = self.begin(snapshot)?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO branches (snapshot_id, repo_name, branch_name, commit_hash)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            let snapshot = snapshot.to_string();
            for branch in branches {
                stmt.execute(params![
                    snapshot,
                    repo_name,
                    branch.name,
                    branch.commit.to_string()
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn save_releases(
        &mut self,
        repo_name: &str,
        snapshot: SnapshotId,
        releases: &[ReleaseRecord],
    ) -> SinkResult<()> {
        let tx = self.begin(snapshot)?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO releases
                 (snapshot_id, repo_name, release_name, component, version, release_timestamp, commit_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            let snapshot = snapshot.to_string();
            for release in releases {
                stmt.execute(params![
                    snapshot,
                    repo_name,
                    release.name,
                    release.component,
                    release.version,
                    rfc3339(release.timestamp),
                    release.commit.to_string()
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn save_commit(
        &mut self,
        repo_name: &str,
        snapshot: SnapshotId,
        commit: &Attribution,
    ) -> SinkResult<()> {
        self.save_commits(repo_name, snapshot, std::slice::from_ref(commit))
    }

    fn save_commits(
        &mut self,
        repo_name: &str,
        snapshot: SnapshotId,
        commits: &[Attribution],
    ) -> SinkResult<()> {
        let tx = self.begin(snapshot)?;
        {
            let mut insert_commit = tx.prepare_cached(
                "INSERT INTO commits
                 (snapshot_id, repo_name, commit_hash, commit_timestamp, claimed_by, release_timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            let mut insert_parent = tx.prepare_cached(
                "INSERT INTO commit_parents (snapshot_id, commit_hash, parent_hash, ordinal)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            let snapshot = snapshot.to_string();
            for commit in commits {
                let hash = commit.commit.to_string();
                insert_commit.execute(params![
                    snapshot,
                    repo_name,
                    hash,
                    rfc3339(commit.authored_at),
                    commit.claimed_by,
                    rfc3339(commit.release_timestamp)
                ])?;
                for (ordinal, parent) in commit.parents.iter().enumerate() {
                    insert_parent.execute(params![
                        snapshot,
                        hash,
                        parent.to_string(),
                        ordinal as i64
                    ])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn complete_snapshot(&mut self, snapshot: SnapshotId, totals: &SnapshotTotals) -> SinkResult<()> {
        let updated = self.conn.execute(
            "UPDATE snapshots SET completed_at = ?1, commit_count = ?2, anomaly_count = ?3
             WHERE snapshot_id = ?4",
            params![
                Utc::now().to_rfc3339(),
                totals.commits as i64,
                totals.anomalies as i64,
                snapshot.to_string()
            ],
        )?;
        if updated == 0 {
            return Err(SinkError::UnknownSnapshot(snapshot.to_string()));
        }
        Ok(())
    }
}
