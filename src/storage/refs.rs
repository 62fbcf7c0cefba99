//! Reference listing and resolution.
//!
//! Git refs are pointers to commits. An export reads two namespaces:
//! - branch heads under `refs/heads/`
//! - tags under `refs/tags/` (lightweight or annotated)
//!
//! Targets are pinned when the refs are listed, so later traversal works
//! against a fixed set of roots even if the repository moves on.

use git2::{ObjectType, Oid, Reference, Repository};
use tracing::{debug, warn};

use crate::storage::errors::{StorageError, StorageResult};
use crate::storage::types::{CommitId, RefEntry, RefNamespace};

/// Reads Git references.
pub struct RefManager;

impl RefManager {
    /// Resolve a full ref name to the commit it currently points to.
    pub fn resolve_ref(repo: &Repository, name: &str) -> StorageResult<CommitId> {
        let reference = repo
            .find_reference(name)
            .map_err(|_| StorageError::RefNotFound(name.to_string()))?;

        let target = Self::pin_target(repo, &reference)
            .ok_or_else(|| StorageError::RefNotFound(name.to_string()))?;

        // the pinned target must be a commit that is actually stored
        match repo.odb()?.read_header(target) {
            Ok((_, ObjectType::Commit)) => Ok(CommitId::new(target)),
            _ => Err(StorageError::RefNotFound(name.to_string())),
        }
    }

    /// List every ref in a namespace, in the order libgit2 yields them.
    ///
    /// Refs that cannot be read at all are skipped with a warning. Refs whose
    /// target does not peel to a commit are still listed with their raw
    /// target, so the failure is reported when the target is resolved.
    pub fn list_refs(repo: &Repository, namespace: RefNamespace) -> StorageResult<Vec<RefEntry>> {
        let mut result = Vec::new();

        for reference in repo.references()? {
            let reference = match reference {
                Ok(reference) => reference,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable reference");
                    continue;
                }
            };

            let Some(name) = reference.name() else {
                warn!("skipping reference with a non utf-8 name");
                continue;
            };
            if !name.starts_with(namespace.prefix()) {
                continue;
            }

            let Some(target) = Self::pin_target(repo, &reference) else {
                warn!(reference = name, "skipping reference without a target");
                continue;
            };

            match RefEntry::new(name, CommitId::new(target)) {
                Ok(entry) => result.push(entry),
                Err(e) => warn!(reference = name, error = %e, "skipping reference"),
            }
        }

        debug!(namespace = namespace.prefix(), count = result.len(), "listed refs");
        Ok(result)
    }

    /// The commit a reference points at, following symbolic refs and
    /// annotated tags by id.
    ///
    /// The target commit itself is never parsed here, so a commit libgit2
    /// rejects still pins. A target that is missing stays as the raw id.
    fn pin_target(repo: &Repository, reference: &Reference<'_>) -> Option<Oid> {
        let mut target = reference
            .resolve()
            .ok()
            .and_then(|resolved| resolved.target())
            .or_else(|| reference.target())?;

        while let Ok(tag) = repo.find_tag(target) {
            target = tag.target_id();
        }
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Signature, Time};
    use tempfile::TempDir;

    fn setup_repo_with_commit() -> (TempDir, Repository, CommitId) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        // scope the borrows
        let commit_id = {
            let tree_id = repo.treebuilder(None).unwrap().write().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            let sig = Signature::new("Test", "test@test.com", &Time::new(100, 0)).unwrap();

            let oid = repo
                .commit(None, &sig, &sig, "Initial commit", &tree, &[])
                .unwrap();
            CommitId::new(oid)
        };

        (dir, repo, commit_id)
    }

    fn names(entries: &[RefEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_list_branches() {
        let (_dir, repo, base) = setup_repo_with_commit();
        {
            let commit = repo.find_commit(base.raw()).unwrap();
            repo.branch("main", &commit, false).unwrap();
            repo.branch("feature/x", &commit, false).unwrap();
        }

        let heads = RefManager::list_refs(&repo, RefNamespace::Heads).unwrap();
        let mut listed = names(&heads);
        listed.sort();
        assert_eq!(listed, vec!["refs/heads/feature/x", "refs/heads/main"]);
        assert!(heads.iter().all(|e| e.target == base));

        let tags = RefManager::list_refs(&repo, RefNamespace::Tags).unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn test_annotated_tags_are_peeled() {
        let (_dir, repo, base) = setup_repo_with_commit();
        {
            let object = repo.find_object(base.raw(), None).unwrap();
            let sig = Signature::new("Tagger", "t@test.com", &Time::new(500, 0)).unwrap();
            repo.tag("app@1.0", &object, &sig, "release 1.0", false).unwrap();
            repo.tag_lightweight("app@1.1", &object, false).unwrap();
        }

        let tags = RefManager::list_refs(&repo, RefNamespace::Tags).unwrap();
        assert_eq!(tags.len(), 2);
        assert!(tags.iter().all(|e| e.target == base));

        let resolved = RefManager::resolve_ref(&repo, "refs/tags/app@1.0").unwrap();
        assert_eq!(resolved, base);
    }

    #[test]
    fn test_tag_on_unparsable_commit_pins_the_commit() {
        let (_dir, repo, base) = setup_repo_with_commit();
        let tree_id = repo.treebuilder(None).unwrap().write().unwrap();
        let data = format!(
            "tree {}\nparent {}\nauthor Broken 200 +0000\ncommitter Dev <d@e> 200 +0000\n\nbroken\n",
            tree_id, base
        );
        let broken = repo
            .odb()
            .unwrap()
            .write(ObjectType::Commit, data.as_bytes())
            .unwrap();
        let tag_data = format!(
            "object {}\ntype commit\ntag app@1.0\ntagger Dev <d@e> 300 +0000\n\nrelease\n",
            broken
        );
        let tag = repo
            .odb()
            .unwrap()
            .write(ObjectType::Tag, tag_data.as_bytes())
            .unwrap();
        repo.reference("refs/tags/app@1.0", tag, true, "tag").unwrap();

        let tags = RefManager::list_refs(&repo, RefNamespace::Tags).unwrap();
        assert_eq!(tags[0].target, CommitId::new(broken));
        assert_eq!(
            RefManager::resolve_ref(&repo, "refs/tags/app@1.0").unwrap(),
            CommitId::new(broken)
        );
    }

    #[test]
    fn test_dangling_ref_keeps_raw_target() {
        let (_dir, repo, _base) = setup_repo_with_commit();
        let ghost = "1111111111111111111111111111111111111111";
        let tags_dir = repo.path().join("refs").join("tags");
        std::fs::create_dir_all(&tags_dir).unwrap();
        std::fs::write(tags_dir.join("ghost@1.0"), format!("{}\n", ghost)).unwrap();

        let tags = RefManager::list_refs(&repo, RefNamespace::Tags).unwrap();
        assert_eq!(names(&tags), vec!["refs/tags/ghost@1.0"]);
        assert_eq!(tags[0].target.to_string(), ghost);

        let result = RefManager::resolve_ref(&repo, "refs/tags/ghost@1.0");
        assert!(matches!(result, Err(StorageError::RefNotFound(_))));
    }

    #[test]
    fn test_resolve_missing_ref() {
        let (_dir, repo, _base) = setup_repo_with_commit();
        let result = RefManager::resolve_ref(&repo, "refs/heads/nope");
        assert!(matches!(result, Err(StorageError::RefNotFound(_))));
    }
}
