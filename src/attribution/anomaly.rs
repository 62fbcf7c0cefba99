//! Recoverable problems found during a run.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::storage::CommitId;

/// A problem that was recovered from locally. Anomalies never abort a run;
/// they are logged as they happen and returned with the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// The root's target commit could not be loaded; the root was skipped.
    UnresolvedRoot {
        reference: String,
        target: CommitId,
        reason: String,
    },
    /// The commit's author line has no parseable time.
    MissingAuthorship { commit: CommitId },
    /// A parent id does not load; the edge was dropped.
    MissingParent {
        commit: CommitId,
        parent: CommitId,
        reason: String,
    },
}

impl Anomaly {
    /// Emit the anomaly as a warning.
    pub fn log(&self) {
        match self {
            Anomaly::UnresolvedRoot {
                reference,
                target,
                reason,
            } => warn!(reference = %reference, target = %target, reason = %reason, "skipping unresolvable root"),
            Anomaly::MissingAuthorship { commit } => {
                warn!(commit = %commit, "commit has no parseable authorship time")
            }
            Anomaly::MissingParent {
                commit,
                parent,
                reason,
            } => warn!(commit = %commit, parent = %parent, reason = %reason, "dropping unresolvable parent edge"),
        }
    }

    /// The commit the anomaly is attached to.
    pub fn commit(&self) -> CommitId {
        match self {
            Anomaly::UnresolvedRoot { target, .. } => *target,
            Anomaly::MissingAuthorship { commit } | Anomaly::MissingParent { commit, .. } => *commit,
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::UnresolvedRoot {
                reference,
                target,
                reason,
            } => write!(f, "{} -> {}: unresolvable root ({})", reference, target.short(), reason),
            Anomaly::MissingAuthorship { commit } => {
                write!(f, "{}: missing authorship time", commit.short())
            }
            Anomaly::MissingParent {
                commit,
                parent,
                reason,
            } => write!(f, "{}: parent {} unresolvable ({})", commit.short(), parent.short(), reason),
        }
    }
}
