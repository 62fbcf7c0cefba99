//! The commit attribution walk.
//!
//! Roots are processed releases first, then branches, each list oldest
//! first. For every root the engine walks parent edges from the root
//! commit and claims each commit not already claimed by an earlier root.
//! The walk stops at claimed commits, so shared history is visited once per
//! run no matter how many roots reach it.

use tracing::debug;

use super::anomaly::Anomaly;
use super::frontier::{ClaimCache, ClaimState, FrontierRoot};
use super::types::{Attribution, AttributionRun, Phase, RootOutcome};
use crate::catalog::{Branch, Release};
use crate::storage::{CommitId, CommitInfo, CommitSource, RefEntry};

/// Partitions commit history across an ordered list of roots.
///
/// One engine serves one run: the frontier and the claim cache it builds up
/// are what make later roots cheap.
pub struct AttributionEngine<'a, S: ?Sized> {
    source: &'a S,
    claims: ClaimCache,
}

impl<'a, S: CommitSource + ?Sized> AttributionEngine<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            claims: ClaimCache::new(),
        }
    }

    /// Process every release, then every branch.
    pub fn run(&mut self, releases: &[Release], branches: &[Branch]) -> AttributionRun {
        let mut run = AttributionRun::default();

        for release in releases {
            run.absorb(self.attribute_root(&release.entry, Phase::Release));
        }
        for branch in branches {
            run.absorb(self.attribute_root(&branch.entry, Phase::Branch));
        }

        run
    }

    /// Claim everything reachable from `root` that no earlier root reached.
    ///
    /// A root whose target cannot be loaded is skipped with an anomaly and
    /// does not join the frontier.
    pub fn attribute_root(&mut self, root: &RefEntry, phase: Phase) -> RootOutcome {
        let mut outcome = RootOutcome::new(&root.name, phase);

        let root_commit = match self.source.get_commit(root.target) {
            Ok(commit) => commit,
            Err(e) => {
                let anomaly = Anomaly::UnresolvedRoot {
                    reference: root.name.clone(),
                    target: root.target,
                    reason: e.to_string(),
                };
                anomaly.log();
                outcome.anomalies.push(anomaly);
                outcome.skipped = true;
                return outcome;
            }
        };

        let release_timestamp = match phase {
            Phase::Release => root_commit.authored_at,
            Phase::Branch => None,
        };

        if !self.claims.mark_pending(root_commit.id) {
            // an earlier root already reached this commit, and with it the
            // whole ancestry
            debug!(root = %root.name, commit = %root_commit.id.short(), "root already claimed");
            self.claims.close_walk(&root.name, root_commit.id, std::iter::empty());
            return outcome;
        }

        let mut stack = vec![root_commit];
        while let Some(commit) = stack.pop() {
            let (parents, discovered) = self.expand_parents(&commit, &mut outcome.anomalies);

            // reversed so the first parent is walked first
            stack.extend(discovered.into_iter().rev());

            if commit.authored_at.is_none() {
                let anomaly = Anomaly::MissingAuthorship { commit: commit.id };
                anomaly.log();
                outcome.anomalies.push(anomaly);
            }

            outcome.attributions.push(Attribution {
                commit: commit.id,
                authored_at: commit.authored_at,
                claimed_by: root.name.clone(),
                release_timestamp,
                parents,
            });
        }

        self.claims.close_walk(
            &root.name,
            root.target,
            outcome.attributions.iter().map(|a| a.commit),
        );

        debug!(
            root = %root.name,
            phase = %phase,
            claimed = outcome.attributions.len(),
            "attributed root"
        );
        outcome
    }

    /// Look at each parent of `commit`. Returns the parents that resolve (the
    /// edges to record) and the parents reached for the first time (the
    /// commits still to walk).
    fn expand_parents(
        &mut self,
        commit: &CommitInfo,
        anomalies: &mut Vec<Anomaly>,
    ) -> (Vec<CommitId>, Vec<CommitInfo>) {
        let mut parents = Vec::with_capacity(commit.parent_ids.len());
        let mut discovered = Vec::new();

        for &parent in &commit.parent_ids {
            let missing_reason = match self.claims.state(&parent) {
                Some(ClaimState::Pending) | Some(ClaimState::Claimed { .. }) => {
                    parents.push(parent);
                    continue;
                }
                Some(ClaimState::Missing { reason }) => reason.clone(),
                None => match self.source.get_commit(parent) {
                    Ok(info) => {
                        self.claims.mark_pending(parent);
                        parents.push(parent);
                        discovered.push(info);
                        continue;
                    }
                    Err(e) => {
                        let reason = e.to_string();
                        self.claims.mark_missing(parent, reason.clone());
                        reason
                    }
                },
            };

            let anomaly = Anomaly::MissingParent {
                commit: commit.id,
                parent,
                reason: missing_reason,
            };
            anomaly.log();
            anomalies.push(anomaly);
        }

        (parents, discovered)
    }

    /// The root that claimed a commit, if any.
    pub fn claimant(&self, commit: &CommitId) -> Option<&str> {
        self.claims.claimant(commit).map(|root| root.name.as_str())
    }

    /// Roots processed so far (excluding skipped ones), in order.
    pub fn frontier(&self) -> &[FrontierRoot] {
        self.claims.frontier()
    }

    /// Number of commits claimed so far in this run.
    pub fn claimed_count(&self) -> usize {
        self.claims.claimed_count()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::{HashMap, HashSet};

    use super::*;
    use crate::catalog::{RefCatalog, ReleasePattern};
    use crate::storage::{MemoryRepository, RefNamespace, StorageResult};

    fn id(n: u64) -> CommitId {
        MemoryRepository::synthetic_id(n)
    }

    fn entry(name: &str, target: CommitId) -> RefEntry {
        RefEntry::new(name, target).unwrap()
    }

    fn run_catalog(repo: &MemoryRepository) -> AttributionRun {
        let catalog = RefCatalog::load(repo, &ReleasePattern::default()).unwrap();
        AttributionEngine::new(repo).run(&catalog.releases, &catalog.branches)
    }

    fn claimed_by(run: &AttributionRun) -> HashMap<CommitId, String> {
        let mut map = HashMap::new();
        for attribution in &run.attributions {
            let previous = map.insert(attribution.commit, attribution.claimed_by.clone());
            assert!(previous.is_none(), "commit {} attributed twice", attribution.commit);
        }
        map
    }

    /// Counts commit loads to check the walk never reloads history.
    struct CountingSource<'a> {
        inner: &'a MemoryRepository,
        loads: Cell<usize>,
    }

    impl CommitSource for CountingSource<'_> {
        fn list_refs(&self, namespace: RefNamespace) -> StorageResult<Vec<RefEntry>> {
            self.inner.list_refs(namespace)
        }

        fn resolve_ref(&self, name: &str) -> StorageResult<CommitId> {
            self.inner.resolve_ref(name)
        }

        fn get_commit(&self, id: CommitId) -> StorageResult<CommitInfo> {
            self.loads.set(self.loads.get() + 1);
            self.inner.get_commit(id)
        }
    }

    #[test]
    fn test_releases_then_branch_scenario() {
        // B <- A <- C <- D
        let mut repo = MemoryRepository::new();
        let b = repo.add_commit(id(2), Some(50), &[]);
        let a = repo.add_commit(id(1), Some(100), &[b]);
        let c = repo.add_commit(id(3), Some(300), &[a]);
        let d = repo.add_commit(id(4), Some(400), &[c]);
        repo.add_ref("refs/heads/main", d).unwrap();
        repo.add_ref("refs/tags/v1@2.0", c).unwrap();
        repo.add_ref("refs/tags/v1@1.0", a).unwrap();

        let run = run_catalog(&repo);
        let claims = claimed_by(&run);

        assert_eq!(claims.len(), 4);
        assert_eq!(claims[&a], "refs/tags/v1@1.0");
        assert_eq!(claims[&b], "refs/tags/v1@1.0");
        assert_eq!(claims[&c], "refs/tags/v1@2.0");
        assert_eq!(claims[&d], "refs/heads/main");
        assert!(run.anomalies.is_empty());

        // release claims carry the release's own timestamp
        let b_record = run.attribution_of(&b).unwrap();
        assert_eq!(b_record.release_timestamp.unwrap().timestamp(), 100);
        assert_eq!(b_record.authored_at.unwrap().timestamp(), 50);
        assert_eq!(run.attribution_of(&d).unwrap().release_timestamp, None);
        assert_eq!(run.attribution_of(&c).unwrap().parents, vec![a]);
    }

    #[test]
    fn test_intermediate_commit_goes_to_later_release() {
        // A <- B <- C: B is not reachable from A, so v1@2.0 claims it
        let mut repo = MemoryRepository::new();
        let a = repo.add_commit(id(1), Some(100), &[]);
        let b = repo.add_commit(id(2), Some(200), &[a]);
        let c = repo.add_commit(id(3), Some(300), &[b]);
        repo.add_ref("refs/tags/v1@1.0", a).unwrap();
        repo.add_ref("refs/tags/v1@2.0", c).unwrap();

        let claims = claimed_by(&run_catalog(&repo));
        assert_eq!(claims[&a], "refs/tags/v1@1.0");
        assert_eq!(claims[&b], "refs/tags/v1@2.0");
        assert_eq!(claims[&c], "refs/tags/v1@2.0");
    }

    #[test]
    fn test_branches_ordered_by_date() {
        let mut repo = MemoryRepository::new();
        let e = repo.add_commit(id(5), Some(150), &[]);
        let f = repo.add_commit(id(6), Some(200), &[e]);
        repo.add_ref("refs/heads/feature-y", f).unwrap();
        repo.add_ref("refs/heads/feature-x", e).unwrap();

        let run = run_catalog(&repo);
        let claims = claimed_by(&run);
        assert_eq!(claims[&e], "refs/heads/feature-x");
        assert_eq!(claims[&f], "refs/heads/feature-y");
        assert_eq!(run.roots[0].root, "refs/heads/feature-x");
        assert_eq!(run.roots[0].claimed, 1);
        assert_eq!(run.roots[1].claimed, 1);
    }

    #[test]
    fn test_release_with_unparsable_authorship() {
        let mut repo = MemoryRepository::new();
        let base = repo.add_commit(id(1), Some(100), &[]);
        let broken = repo.add_commit(id(2), None, &[base]);
        repo.add_ref("refs/tags/app@1.0", broken).unwrap();

        let run = run_catalog(&repo);
        let record = run.attribution_of(&broken).unwrap();
        assert_eq!(record.claimed_by, "refs/tags/app@1.0");
        assert_eq!(record.release_timestamp, None);
        assert_eq!(record.authored_at, None);
        assert_eq!(run.attribution_of(&base).unwrap().release_timestamp, None);
        assert_eq!(
            run.anomalies,
            vec![Anomaly::MissingAuthorship { commit: broken }]
        );
    }

    #[test]
    fn test_release_wins_over_older_branch() {
        // the branch is older than the release, but releases go first
        let mut repo = MemoryRepository::new();
        let base = repo.add_commit(id(1), Some(100), &[]);
        let tip = repo.add_commit(id(2), Some(150), &[base]);
        let release = repo.add_commit(id(3), Some(900), &[tip]);
        repo.add_ref("refs/heads/old", tip).unwrap();
        repo.add_ref("refs/tags/svc@1.0", release).unwrap();

        let claims = claimed_by(&run_catalog(&repo));
        assert_eq!(claims[&base], "refs/tags/svc@1.0");
        assert_eq!(claims[&tip], "refs/tags/svc@1.0");
        assert_eq!(claims[&release], "refs/tags/svc@1.0");
    }

    #[test]
    fn test_merge_commit_attributed_once() {
        //      base
        //     /    \
        //  left    right
        //     \    /
        //     merge
        let mut repo = MemoryRepository::new();
        let base = repo.add_commit(id(1), Some(100), &[]);
        let left = repo.add_commit(id(2), Some(200), &[base]);
        let right = repo.add_commit(id(3), Some(210), &[base]);
        let merge = repo.add_commit(id(4), Some(300), &[left, right]);
        repo.add_ref("refs/heads/main", merge).unwrap();
        repo.add_ref("refs/heads/topic", right).unwrap();

        let run = run_catalog(&repo);
        let claims = claimed_by(&run);
        assert_eq!(claims.len(), 4);
        assert_eq!(claims[&right], "refs/heads/topic");
        assert_eq!(claims[&base], "refs/heads/topic");
        assert_eq!(claims[&left], "refs/heads/main");
        assert_eq!(claims[&merge], "refs/heads/main");

        // both parent edges are recorded even though one is claimed elsewhere
        assert_eq!(run.attribution_of(&merge).unwrap().parents, vec![left, right]);
    }

    #[test]
    fn test_walk_order_is_root_first_then_first_parent() {
        let mut repo = MemoryRepository::new();
        let base = repo.add_commit(id(1), Some(100), &[]);
        let left = repo.add_commit(id(2), Some(200), &[base]);
        let right = repo.add_commit(id(3), Some(210), &[base]);
        let merge = repo.add_commit(id(4), Some(300), &[left, right]);

        let mut engine = AttributionEngine::new(&repo);
        let outcome = engine.attribute_root(&entry("refs/heads/main", merge), Phase::Branch);
        let order: Vec<CommitId> = outcome.attributions.iter().map(|a| a.commit).collect();
        assert_eq!(order, vec![merge, left, base, right]);
    }

    #[test]
    fn test_dangling_root_is_skipped() {
        let mut repo = MemoryRepository::new();
        let a = repo.add_commit(id(1), Some(100), &[]);
        repo.add_ref("refs/tags/ghost@1.0", id(99)).unwrap();
        repo.add_ref("refs/heads/main", a).unwrap();

        let catalog = RefCatalog::load(&repo, &ReleasePattern::default()).unwrap();
        let mut engine = AttributionEngine::new(&repo);
        let run = engine.run(&catalog.releases, &catalog.branches);

        assert_eq!(run.skipped_roots(), 1);
        assert!(matches!(
            &run.anomalies[..],
            [Anomaly::UnresolvedRoot { reference, .. }] if reference == "refs/tags/ghost@1.0"
        ));
        assert_eq!(claimed_by(&run)[&a], "refs/heads/main");

        // the skipped root never joined the frontier
        let frontier: Vec<&str> = engine.frontier().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(frontier, vec!["refs/heads/main"]);
    }

    #[test]
    fn test_missing_parent_edge_is_dropped() {
        let mut repo = MemoryRepository::new();
        let lost = id(77);
        let base = repo.add_commit(id(1), Some(100), &[]);
        let tip = repo.add_commit(id(2), Some(200), &[base, lost]);
        let other = repo.add_commit(id(3), Some(300), &[lost]);
        repo.add_ref("refs/heads/main", tip).unwrap();
        repo.add_ref("refs/heads/other", other).unwrap();

        let run = run_catalog(&repo);
        assert_eq!(run.attribution_of(&tip).unwrap().parents, vec![base]);
        assert!(run.attribution_of(&other).unwrap().parents.is_empty());
        assert!(run.attribution_of(&lost).is_none());

        // each child referencing the lost parent carries its own anomaly
        let attached: Vec<CommitId> = run.anomalies.iter().map(|a| a.commit()).collect();
        assert_eq!(attached, vec![tip, other]);
    }

    #[test]
    fn test_already_claimed_root_claims_nothing() {
        let mut repo = MemoryRepository::new();
        let a = repo.add_commit(id(1), Some(100), &[]);
        let b = repo.add_commit(id(2), Some(200), &[a]);

        let mut engine = AttributionEngine::new(&repo);
        let first = engine.attribute_root(&entry("refs/heads/main", b), Phase::Branch);
        let second = engine.attribute_root(&entry("refs/heads/copy", b), Phase::Branch);
        let third = engine.attribute_root(&entry("refs/heads/older", a), Phase::Branch);

        assert_eq!(first.claimed(), 2);
        assert_eq!(second.claimed(), 0);
        assert_eq!(third.claimed(), 0);
        assert!(!second.skipped);
        assert_eq!(engine.frontier().len(), 3);
        assert_eq!(engine.claimant(&a), Some("refs/heads/main"));
        assert_eq!(engine.claimed_count(), 2);
    }

    #[test]
    fn test_shared_history_loaded_once() {
        // a long trunk with many branches forking off its tip
        let mut repo = MemoryRepository::new();
        let mut previous = repo.add_commit(id(1), Some(1), &[]);
        for n in 2..=200 {
            previous = repo.add_commit(id(n), Some(n as i64), &[previous]);
        }
        let trunk = previous;
        repo.add_ref("refs/heads/trunk", trunk).unwrap();
        for n in 0..50u64 {
            let tip = repo.add_commit(id(1000 + n), Some(1000 + n as i64), &[trunk]);
            repo.add_ref(&format!("refs/heads/topic-{}", n), tip).unwrap();
        }

        let catalog = RefCatalog::load(&repo, &ReleasePattern::default()).unwrap();
        let counting = CountingSource {
            inner: &repo,
            loads: Cell::new(0),
        };
        let run = AttributionEngine::new(&counting).run(&catalog.releases, &catalog.branches);

        assert_eq!(run.attributions.len(), repo.len());
        // one load per commit plus nothing else: every root is a fresh commit
        assert_eq!(counting.loads.get(), repo.len());
    }

    /// Deterministic pseudo-random DAG with merges and several roots.
    fn generated_repo(seed: u64, size: u64) -> MemoryRepository {
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            state >> 33
        };

        let mut repo = MemoryRepository::new();
        for n in 1..=size {
            let mut parents = Vec::new();
            if n > 1 {
                parents.push(id(1 + next() % (n - 1)));
                if next() % 4 == 0 {
                    let second = id(1 + next() % (n - 1));
                    if !parents.contains(&second) {
                        parents.push(second);
                    }
                }
            }
            let authored = if next() % 17 == 0 { None } else { Some(n as i64 * 10) };
            repo.add_commit(id(n), authored, &parents);
        }

        for r in 0..8 {
            let target = id(1 + next() % size);
            let name = if r % 3 == 0 {
                format!("refs/tags/pkg@{}.0", r)
            } else {
                format!("refs/heads/b{}", r)
            };
            repo.add_ref(&name, target).unwrap();
        }
        repo
    }

    fn ancestry(repo: &MemoryRepository, start: CommitId) -> HashSet<CommitId> {
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(commit) = stack.pop() {
            if !seen.insert(commit) {
                continue;
            }
            if let Ok(info) = repo.get_commit(commit) {
                stack.extend(info.parent_ids);
            }
        }
        seen
    }

    #[test]
    fn test_partition_and_earliest_claim_against_naive_walk() {
        for seed in [1, 7, 42, 1234] {
            let repo = generated_repo(seed, 120);
            let catalog = RefCatalog::load(&repo, &ReleasePattern::default()).unwrap();
            let run = AttributionEngine::new(&repo).run(&catalog.releases, &catalog.branches);
            let claims = claimed_by(&run);

            // naive oracle: the first root in processing order reaching a commit
            let order: Vec<&RefEntry> = catalog
                .releases
                .iter()
                .map(|r| &r.entry)
                .chain(catalog.branches.iter().map(|b| &b.entry))
                .collect();
            let mut expected: HashMap<CommitId, String> = HashMap::new();
            for root in order {
                for commit in ancestry(&repo, root.target) {
                    expected.entry(commit).or_insert_with(|| root.name.clone());
                }
            }

            assert_eq!(claims, expected, "seed {}", seed);
        }
    }

    #[test]
    fn test_rerun_is_identical() {
        let repo = generated_repo(99, 80);
        let first = run_catalog(&repo);
        let second = run_catalog(&repo);
        assert_eq!(first.attributions, second.attributions);
        assert_eq!(first.anomalies, second.anomalies);
        assert_eq!(first.roots, second.roots);
    }
}
