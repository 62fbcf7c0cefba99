//! Classified refs.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::storage::{CommitId, RefEntry};

/// A tag-like ref whose name matches the release pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Release {
    pub entry: RefEntry,
    pub component: String,
    pub version: String,
    /// Authorship time of the target commit; stamped onto every commit
    /// the release claims.
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl Release {
    /// Full ref name.
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn target(&self) -> CommitId {
        self.entry.target
    }
}

/// A branch head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub entry: RefEntry,
    /// Authorship time of the target commit, used for ordering only.
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl Branch {
    /// Full ref name.
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn target(&self) -> CommitId {
        self.entry.target
    }
}
