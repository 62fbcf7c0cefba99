//! In-memory `CommitSource` for hand-built commit graphs.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use crate::storage::commit::CommitInfo;
use crate::storage::errors::{StorageError, StorageResult};
use crate::storage::source::CommitSource;
use crate::storage::types::{CommitId, RefEntry, RefNamespace};

/// A commit graph held in memory.
///
/// Refs are listed in insertion order. A ref may point at an id with no
/// commit behind it, which models a dangling ref.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    commits: HashMap<CommitId, CommitInfo>,
    refs: Vec<RefEntry>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic commit id for the n-th synthetic commit.
    pub fn synthetic_id(n: u64) -> CommitId {
        CommitId::from_hex(&format!("{:040x}", n)).expect("40 hex digits always parse")
    }

    /// Add a commit authored at `seconds` (UTC) or with no authorship time.
    pub fn add_commit(
        &mut self,
        id: CommitId,
        seconds: Option<i64>,
        parents: &[CommitId],
    ) -> CommitId {
        let authored_at = seconds.and_then(utc_instant);
        self.insert(CommitInfo::new(id, parents.to_vec(), authored_at))
    }

    /// Add a fully specified commit.
    pub fn insert(&mut self, info: CommitInfo) -> CommitId {
        let id = info.id;
        self.commits.insert(id, info);
        id
    }

    /// Point a ref at a commit id (which need not exist).
    pub fn add_ref(&mut self, name: &str, target: CommitId) -> StorageResult<()> {
        let entry = RefEntry::new(name, target)?;
        self.refs.retain(|existing| existing.name != entry.name);
        self.refs.push(entry);
        Ok(())
    }

    /// Number of commits in the graph.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

fn utc_instant(seconds: i64) -> Option<DateTime<FixedOffset>> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .map(|at| at.fixed_offset())
}

impl CommitSource for MemoryRepository {
    fn list_refs(&self, namespace: RefNamespace) -> StorageResult<Vec<RefEntry>> {
        Ok(self
            .refs
            .iter()
            .filter(|entry| entry.namespace() == Some(namespace))
            .cloned()
            .collect())
    }

    fn resolve_ref(&self, name: &str) -> StorageResult<CommitId> {
        let entry = self
            .refs
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| StorageError::RefNotFound(name.to_string()))?;

        if !self.commits.contains_key(&entry.target) {
            return Err(StorageError::RefNotFound(name.to_string()));
        }
        Ok(entry.target)
    }

    fn get_commit(&self, id: CommitId) -> StorageResult<CommitInfo> {
        self.commits
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::CommitNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_repository() {
        let mut repo = MemoryRepository::new();
        let a = repo.add_commit(MemoryRepository::synthetic_id(1), Some(100), &[]);
        let b = repo.add_commit(MemoryRepository::synthetic_id(2), None, &[a]);
        repo.add_ref("refs/heads/main", b).unwrap();
        repo.add_ref("refs/tags/x@1.0", a).unwrap();
        repo.add_ref("refs/tags/ghost@1.0", MemoryRepository::synthetic_id(99)).unwrap();

        assert_eq!(repo.len(), 2);
        assert_eq!(repo.get_commit(b).unwrap().parent_ids, vec![a]);
        assert_eq!(repo.get_commit(b).unwrap().authored_at, None);
        assert_eq!(repo.get_commit(a).unwrap().authored_at.unwrap().timestamp(), 100);

        assert_eq!(repo.list_refs(RefNamespace::Heads).unwrap().len(), 1);
        assert_eq!(repo.list_refs(RefNamespace::Tags).unwrap().len(), 2);

        assert_eq!(repo.resolve_ref("refs/heads/main").unwrap(), b);
        assert!(repo.resolve_ref("refs/tags/ghost@1.0").is_err());
        assert!(matches!(
            repo.get_commit(MemoryRepository::synthetic_id(99)),
            Err(StorageError::CommitNotFound(_))
        ));
    }

    #[test]
    fn test_add_ref_replaces() {
        let mut repo = MemoryRepository::new();
        let a = repo.add_commit(MemoryRepository::synthetic_id(1), Some(100), &[]);
        let b = repo.add_commit(MemoryRepository::synthetic_id(2), Some(200), &[a]);
        repo.add_ref("refs/heads/main", a).unwrap();
        repo.add_ref("refs/heads/main", b).unwrap();

        let heads = repo.list_refs(RefNamespace::Heads).unwrap();
        assert_eq!(heads.len(), 1);
        assert_eq!(heads[0].target, b);
        assert!(repo.add_ref("main", a).is_err());
    }
}
