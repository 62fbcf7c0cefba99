//! Claimed frontier and per-run claim cache.
//!
//! The claimed set is always ancestor-closed: it is the union of the
//! ancestries of every frontier root. A walk that stops at claimed commits
//! therefore excludes exactly the history reachable from the frontier,
//! without re-walking it.

use std::collections::HashMap;

use crate::storage::CommitId;

/// State of a commit in the claim cache. Commits not in the cache are
/// unvisited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimState {
    /// Reached by the walk of the current root, not yet committed to it.
    Pending,
    /// Ancestor-or-self of a frontier root; `root` indexes the frontier.
    Claimed { root: usize },
    /// Listed as a parent but could not be loaded.
    Missing { reason: String },
}

/// A root whose ancestry has been attributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierRoot {
    pub name: String,
    pub commit: CommitId,
}

/// Frontier roots plus the commit -> state map.
#[derive(Debug, Default)]
pub struct ClaimCache {
    states: HashMap<CommitId, ClaimState>,
    frontier: Vec<FrontierRoot>,
}

impl ClaimCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, commit: &CommitId) -> Option<&ClaimState> {
        self.states.get(commit)
    }

    pub fn is_claimed(&self, commit: &CommitId) -> bool {
        matches!(self.states.get(commit), Some(ClaimState::Claimed { .. }))
    }

    /// Mark a commit as reached by the current walk. Returns false if it was
    /// already pending or claimed.
    pub fn mark_pending(&mut self, commit: CommitId) -> bool {
        match self.states.get(&commit) {
            Some(ClaimState::Pending) | Some(ClaimState::Claimed { .. }) => false,
            _ => {
                self.states.insert(commit, ClaimState::Pending);
                true
            }
        }
    }

    pub fn mark_missing(&mut self, commit: CommitId, reason: impl Into<String>) {
        self.states.insert(
            commit,
            ClaimState::Missing {
                reason: reason.into(),
            },
        );
    }

    /// Add a root to the frontier and claim every pending commit of its walk.
    pub fn close_walk(
        &mut self,
        root_name: &str,
        root_commit: CommitId,
        walked: impl IntoIterator<Item = CommitId>,
    ) {
        let root = self.frontier.len();
        self.frontier.push(FrontierRoot {
            name: root_name.to_string(),
            commit: root_commit,
        });

        for commit in walked {
            if let Some(state) = self.states.get_mut(&commit) {
                if *state == ClaimState::Pending {
                    *state = ClaimState::Claimed { root };
                }
            }
        }
    }

    /// The frontier root that claimed a commit.
    pub fn claimant(&self, commit: &CommitId) -> Option<&FrontierRoot> {
        match self.states.get(commit) {
            Some(ClaimState::Claimed { root }) => self.frontier.get(*root),
            _ => None,
        }
    }

    pub fn frontier(&self) -> &[FrontierRoot] {
        &self.frontier
    }

    /// Number of commits claimed so far.
    pub fn claimed_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| matches!(s, ClaimState::Claimed { .. }))
            .count()
    }
}
