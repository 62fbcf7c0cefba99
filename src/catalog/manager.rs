//! Ref catalog: classification and date ordering of the export roots.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use super::pattern::ReleasePattern;
use super::types::{Branch, Release};
use crate::storage::{CommitId, CommitSource, RefEntry, RefNamespace, StorageResult};

/// The refs of one export, split into releases and branches.
///
/// Both lists are sorted ascending by the authorship time of their target
/// commit. Refs without a usable time (target missing, or author line
/// malformed) come after every dated ref, in listing order.
#[derive(Debug, Clone, Default)]
pub struct RefCatalog {
    pub releases: Vec<Release>,
    pub branches: Vec<Branch>,
    /// Tags (and refs outside the two namespaces) that are not releases.
    pub ignored: Vec<RefEntry>,
}

impl RefCatalog {
    /// List branch heads and tags from the source and classify them.
    ///
    /// Targets are pinned here, before any traversal starts.
    pub fn load<S: CommitSource + ?Sized>(
        source: &S,
        pattern: &ReleasePattern,
    ) -> StorageResult<Self> {
        let mut refs = source.list_refs(RefNamespace::Heads)?;
        refs.extend(source.list_refs(RefNamespace::Tags)?);
        Ok(Self::classify_and_sort(refs, source, pattern))
    }

    /// Classify refs into releases and branches and order each by date.
    ///
    /// Any ref whose short name matches the release pattern is a release;
    /// the remaining branch heads are branches. Refs sharing a target are
    /// kept as separate entries.
    pub fn classify_and_sort<S: CommitSource + ?Sized>(
        refs: Vec<RefEntry>,
        source: &S,
        pattern: &ReleasePattern,
    ) -> Self {
        let mut dates = TargetDates::new(source);
        let mut catalog = Self::default();

        for entry in refs {
            if let Some(parsed) = pattern.parse(entry.short_name()) {
                let timestamp = dates.lookup(entry.target);
                catalog.releases.push(Release {
                    entry,
                    component: parsed.component,
                    version: parsed.version,
                    timestamp,
                });
            } else if entry.is_branch() {
                let timestamp = dates.lookup(entry.target);
                catalog.branches.push(Branch { entry, timestamp });
            } else {
                debug!(reference = %entry.name, "ignoring ref that is neither release nor branch");
                catalog.ignored.push(entry);
            }
        }

        // stable sorts: undated refs keep listing order at the end
        catalog.releases.sort_by_key(|r| date_key(r.timestamp));
        catalog.branches.sort_by_key(|b| date_key(b.timestamp));

        debug!(
            releases = catalog.releases.len(),
            branches = catalog.branches.len(),
            ignored = catalog.ignored.len(),
            "classified refs"
        );
        catalog
    }

    /// Total number of roots the engine will process.
    pub fn root_count(&self) -> usize {
        self.releases.len() + self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root_count() == 0
    }
}

/// Sort key placing undated refs last.
fn date_key(timestamp: Option<DateTime<FixedOffset>>) -> (bool, Option<DateTime<FixedOffset>>) {
    (timestamp.is_none(), timestamp)
}

/// Looks up target authorship times, once per distinct target.
struct TargetDates<'a, S: ?Sized> {
    source: &'a S,
    cache: HashMap<CommitId, Option<DateTime<FixedOffset>>>,
}

impl<'a, S: CommitSource + ?Sized> TargetDates<'a, S> {
    fn new(source: &'a S) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    fn lookup(&mut self, target: CommitId) -> Option<DateTime<FixedOffset>> {
        let source = self.source;
        *self.cache.entry(target).or_insert_with(|| match source.get_commit(target) {
            Ok(commit) => commit.authored_at,
            Err(e) => {
                debug!(commit = %target, error = %e, "cannot date ref target, sorting it last");
                None
            }
        })
    }
}
