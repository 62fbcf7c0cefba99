//! Core Git repository wrapper.
//!
//! This wraps `git2::Repository` behind a lock and exposes the read-only
//! operations an export needs. It is the git-backed `CommitSource`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use git2::Repository;
use parking_lot::Mutex;
use tracing::debug;

use crate::storage::commit::{self, CommitInfo};
use crate::storage::errors::{StorageError, StorageResult};
use crate::storage::refs::RefManager;
use crate::storage::source::CommitSource;
use crate::storage::types::{CommitId, RefEntry, RefNamespace};

/// The main Git repository wrapper.
///
/// `git2::Repository` is not `Sync`, so access goes through a mutex.
/// Clone this to share the handle - it uses Arc internally.
#[derive(Clone)]
pub struct GitRepository {
    inner: Arc<GitRepositoryInner>,
}

struct GitRepositoryInner {
    repo: Mutex<Repository>,
    path: PathBuf,
}

impl GitRepository {
    /// Open an existing repository (working tree, `.git` dir or bare repo).
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let repo =
            Repository::open(path).map_err(|_| StorageError::NotARepository(path.to_path_buf()))?;
        debug!(path = %repo.path().display(), bare = repo.is_bare(), "opened repository");

        Ok(Self {
            inner: Arc::new(GitRepositoryInner {
                repo: Mutex::new(repo),
                path: path.to_path_buf(),
            }),
        })
    }

    /// Get the repository path as given to `open`.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// A display name for the repository: the directory name, without a
    /// trailing `.git` (`/src/mpo-ui/.git` and `/src/mpo-ui.git` both give
    /// `mpo-ui`).
    pub fn default_name(&self) -> String {
        // libgit2 reports an absolute path, so "." still names the checkout
        let repo = self.inner.repo.lock();
        default_repo_name(repo.path())
    }

    /// Execute a function with access to the repository.
    pub fn with_repo<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Repository) -> StorageResult<T>,
    {
        let repo = self.inner.repo.lock();
        f(&repo)
    }

    /// Get information about a commit.
    pub fn get_commit(&self, id: CommitId) -> StorageResult<CommitInfo> {
        self.with_repo(|repo| commit::get_commit(repo, id))
    }

    /// Resolve a full ref name to a commit.
    pub fn resolve_ref(&self, name: &str) -> StorageResult<CommitId> {
        self.with_repo(|repo| RefManager::resolve_ref(repo, name))
    }

    /// List the refs in a namespace.
    pub fn list_refs(&self, namespace: RefNamespace) -> StorageResult<Vec<RefEntry>> {
        self.with_repo(|repo| RefManager::list_refs(repo, namespace))
    }
}

impl CommitSource for GitRepository {
    fn list_refs(&self, namespace: RefNamespace) -> StorageResult<Vec<RefEntry>> {
        GitRepository::list_refs(self, namespace)
    }

    fn resolve_ref(&self, name: &str) -> StorageResult<CommitId> {
        GitRepository::resolve_ref(self, name)
    }

    fn get_commit(&self, id: CommitId) -> StorageResult<CommitInfo> {
        GitRepository::get_commit(self, id)
    }
}

/// Derive a repository name from its path.
pub(crate) fn default_repo_name(path: &Path) -> String {
    let mut components = path.components().rev().filter_map(|c| match c {
        std::path::Component::Normal(name) => name.to_str(),
        _ => None,
    });

    let mut name = components.next().unwrap_or("repository");
    if name == ".git" {
        name = components.next().unwrap_or("repository");
    }
    name.strip_suffix(".git").unwrap_or(name).to_string()
}
