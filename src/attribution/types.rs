//! Attribution records and per-root results.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::anomaly::Anomaly;
use crate::storage::CommitId;

/// The pass a root is processed in. Every release is processed before any
/// branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Release,
    Branch,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Release => write!(f, "release"),
            Phase::Branch => write!(f, "branch"),
        }
    }
}

/// One commit assigned to the root that claimed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribution {
    pub commit: CommitId,
    pub authored_at: Option<DateTime<FixedOffset>>,
    /// Full name of the claiming ref.
    pub claimed_by: String,
    /// Authorship time of the claiming release's root commit; always None
    /// for branch claims.
    pub release_timestamp: Option<DateTime<FixedOffset>>,
    /// Parents that resolved, in recorded order.
    pub parents: Vec<CommitId>,
}

/// The result of processing one root.
#[derive(Debug, Clone)]
pub struct RootOutcome {
    pub root: String,
    pub phase: Phase,
    /// Commits newly claimed by this root, root commit first.
    pub attributions: Vec<Attribution>,
    pub anomalies: Vec<Anomaly>,
    /// The root's target could not be loaded.
    pub skipped: bool,
}

impl RootOutcome {
    pub(crate) fn new(root: &str, phase: Phase) -> Self {
        Self {
            root: root.to_string(),
            phase,
            attributions: Vec::new(),
            anomalies: Vec::new(),
            skipped: false,
        }
    }

    pub fn claimed(&self) -> usize {
        self.attributions.len()
    }
}

/// Per-root counts kept by a full run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootSummary {
    pub root: String,
    pub phase: Phase,
    pub claimed: usize,
    pub skipped: bool,
}

/// Everything one run of the engine produced.
#[derive(Debug, Clone, Default)]
pub struct AttributionRun {
    pub attributions: Vec<Attribution>,
    pub anomalies: Vec<Anomaly>,
    pub roots: Vec<RootSummary>,
}

impl AttributionRun {
    pub(crate) fn absorb(&mut self, outcome: RootOutcome) {
        self.roots.push(RootSummary {
            root: outcome.root,
            phase: outcome.phase,
            claimed: outcome.attributions.len(),
            skipped: outcome.skipped,
        });
        self.attributions.extend(outcome.attributions);
        self.anomalies.extend(outcome.anomalies);
    }

    /// The attribution of a commit, if any root claimed it.
    pub fn attribution_of(&self, commit: &CommitId) -> Option<&Attribution> {
        self.attributions.iter().find(|a| &a.commit == commit)
    }

    pub fn skipped_roots(&self) -> usize {
        self.roots.iter().filter(|r| r.skipped).count()
    }
}
