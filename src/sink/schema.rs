//! SQLite schema for snapshot storage.

/// Applied on every open; all statements are idempotent.
pub const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS snapshots (
    snapshot_id   TEXT PRIMARY KEY,
    repo_name     TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    completed_at  TEXT,
    commit_count  INTEGER,
    anomaly_count INTEGER
);

CREATE TABLE IF NOT EXISTS branches (
    snapshot_id TEXT NOT NULL REFERENCES snapshots(snapshot_id),
    repo_name   TEXT NOT NULL,
    branch_name TEXT NOT NULL,
    commit_hash TEXT NOT NULL,
    PRIMARY KEY (snapshot_id, branch_name)
);

CREATE TABLE IF NOT EXISTS releases (
    snapshot_id       TEXT NOT NULL REFERENCES snapshots(snapshot_id),
    repo_name         TEXT NOT NULL,
    release_name      TEXT NOT NULL,
    component         TEXT NOT NULL,
    version           TEXT NOT NULL,
    release_timestamp TEXT,
    commit_hash       TEXT NOT NULL,
    PRIMARY KEY (snapshot_id, release_name)
);

CREATE TABLE IF NOT EXISTS commits (
    snapshot_id       TEXT NOT NULL REFERENCES snapshots(snapshot_id),
    repo_name         TEXT NOT NULL,
    commit_hash       TEXT NOT NULL,
    commit_timestamp  TEXT,
    claimed_by        TEXT NOT NULL,
    release_timestamp TEXT,
    PRIMARY KEY (snapshot_id, commit_hash)
);

CREATE TABLE IF NOT EXISTS commit_parents (
    snapshot_id TEXT NOT NULL,
    commit_hash TEXT NOT NULL,
    parent_hash TEXT NOT NULL,
    ordinal     INTEGER NOT NULL,
    PRIMARY KEY (snapshot_id, commit_hash, ordinal),
    FOREIGN KEY (snapshot_id, commit_hash) REFERENCES commits(snapshot_id, commit_hash)
);

CREATE INDEX IF NOT EXISTS idx_commits_claimed_by ON commits(snapshot_id, claimed_by);
";
