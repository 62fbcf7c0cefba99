//! The read-only view of a repository that the catalog and the attribution
//! engine work against.

use crate::storage::commit::CommitInfo;
use crate::storage::errors::StorageResult;
use crate::storage::types::{CommitId, RefEntry, RefNamespace};

/// Read access to refs and commits.
///
/// Implementations must be deterministic for the duration of a run: the same
/// id always yields the same commit, and `list_refs` yields refs in a stable
/// order.
pub trait CommitSource {
    /// List the refs of one namespace with their pinned targets.
    fn list_refs(&self, namespace: RefNamespace) -> StorageResult<Vec<RefEntry>>;

    /// Resolve a full ref name to the commit it points at.
    fn resolve_ref(&self, name: &str) -> StorageResult<CommitId>;

    /// Load a commit.
    fn get_commit(&self, id: CommitId) -> StorageResult<CommitInfo>;
}

impl<T: CommitSource + ?Sized> CommitSource for &T {
    fn list_refs(&self, namespace: RefNamespace) -> StorageResult<Vec<RefEntry>> {
        (**self).list_refs(namespace)
    }

    fn resolve_ref(&self, name: &str) -> StorageResult<CommitId> {
        (**self).resolve_ref(name)
    }

    fn get_commit(&self, id: CommitId) -> StorageResult<CommitInfo> {
        (**self).get_commit(id)
    }
}
