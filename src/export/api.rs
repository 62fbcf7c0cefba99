//! The export run.

use std::time::Instant;

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{debug, info};

use super::config::ExportConfig;
use super::error::ExportResult;
use crate::attribution::{Anomaly, AttributionEngine, Phase, RootSummary};
use crate::catalog::{RefCatalog, ReleasePattern};
use crate::sink::{BranchRecord, ReleaseRecord, SnapshotId, SnapshotSink, SnapshotTotals};
use crate::storage::{CommitSource, GitRepository};

/// What one export run did.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub snapshot_id: SnapshotId,
    pub repo_name: String,
    pub branches: usize,
    pub releases: usize,
    /// Tags that are not releases.
    pub ignored_refs: usize,
    pub commits: usize,
    pub skipped_roots: usize,
    pub anomalies: Vec<Anomaly>,
    pub roots: Vec<RootSummary>,
    pub elapsed_ms: u64,
}

/// Exports one repository into a snapshot sink.
///
/// ```no_run
/// use gitsnap::export::{ExportConfig, Exporter};
/// use gitsnap::sink::SqliteSink;
///
/// let exporter = Exporter::open(ExportConfig::new("./mpo-ui")).unwrap();
/// let mut sink = SqliteSink::open("snapshots.db").unwrap();
/// let summary = exporter.export(&mut sink).unwrap();
/// println!("{} commits", summary.commits);
/// ```
pub struct Exporter<S> {
    source: S,
    config: ExportConfig,
    pattern: ReleasePattern,
    repo_name: String,
    progress: Option<ProgressBar>,
}

impl Exporter<GitRepository> {
    /// Open the repository named by the config.
    pub fn open(config: ExportConfig) -> ExportResult<Self> {
        let repo = GitRepository::open(&config.repo_path)?;
        let repo_name = config
            .repo_name
            .clone()
            .unwrap_or_else(|| repo.default_name());
        let mut exporter = Self::new(repo, config)?;
        exporter.repo_name = repo_name;
        Ok(exporter)
    }
}

impl<S: CommitSource> Exporter<S> {
    /// Export from any commit source. Fails if the release pattern does not
    /// compile.
    pub fn new(source: S, config: ExportConfig) -> ExportResult<Self> {
        let pattern = ReleasePattern::new(&config.release_pattern)?;
        let repo_name = config.resolved_name();
        Ok(Self {
            source,
            config,
            pattern,
            repo_name,
            progress: None,
        })
    }

    /// Report processed roots on `bar`.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// List and classify the refs without exporting anything.
    pub fn catalog(&self) -> ExportResult<RefCatalog> {
        Ok(RefCatalog::load(&self.source, &self.pattern)?)
    }

    /// Run the export into `sink`.
    ///
    /// Ref targets are pinned when the catalog is built; every root's
    /// commits are saved as one batch right after the root is processed.
    pub fn export<K: SnapshotSink + ?Sized>(&self, sink: &mut K) -> ExportResult<ExportSummary> {
        let started = Instant::now();

        let catalog = self.catalog()?;
        info!(
            repo = %self.repo_name,
            releases = catalog.releases.len(),
            branches = catalog.branches.len(),
            ignored = catalog.ignored.len(),
            "catalogued refs"
        );

        let snapshot = sink.create_snapshot(&self.repo_name)?;
        let branches: Vec<BranchRecord> = catalog.branches.iter().map(BranchRecord::from).collect();
        sink.save_branches(&self.repo_name, snapshot, &branches)?;
        let releases: Vec<ReleaseRecord> = catalog.releases.iter().map(ReleaseRecord::from).collect();
        sink.save_releases(&self.repo_name, snapshot, &releases)?;

        if let Some(bar) = &self.progress {
            bar.set_length(catalog.root_count() as u64);
        }

        let roots = catalog
            .releases
            .iter()
            .map(|r| (&r.entry, Phase::Release))
            .chain(catalog.branches.iter().map(|b| (&b.entry, Phase::Branch)));

        let mut engine = AttributionEngine::new(&self.source);
        let mut commits = 0;
        let mut anomalies = Vec::new();
        let mut summaries = Vec::with_capacity(catalog.root_count());

        for (root, phase) in roots {
            let outcome = engine.attribute_root(root, phase);
            if self.config.verbose {
                info!(root = %outcome.root, phase = %outcome.phase, claimed = outcome.claimed(), "attributed root");
            } else {
                debug!(root = %outcome.root, phase = %outcome.phase, claimed = outcome.claimed(), "attributed root");
            }

            if !outcome.attributions.is_empty() {
                sink.save_commits(&self.repo_name, snapshot, &outcome.attributions)?;
            }

            commits += outcome.claimed();
            summaries.push(RootSummary {
                root: outcome.root.clone(),
                phase: outcome.phase,
                claimed: outcome.claimed(),
                skipped: outcome.skipped,
            });
            anomalies.extend(outcome.anomalies);

            if let Some(bar) = &self.progress {
                bar.set_message(root.short_name().to_string());
                bar.inc(1);
            }
        }

        let skipped_roots = summaries.iter().filter(|s| s.skipped).count();
        let totals = SnapshotTotals {
            branches: branches.len(),
            releases: releases.len(),
            commits,
            anomalies: anomalies.len(),
            skipped_roots,
        };
        sink.complete_snapshot(snapshot, &totals)?;

        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            snapshot = %snapshot,
            commits,
            anomalies = anomalies.len(),
            skipped_roots,
            elapsed_ms,
            "export complete"
        );

        Ok(ExportSummary {
            snapshot_id: snapshot,
            repo_name: self.repo_name.clone(),
            branches: branches.len(),
            releases: releases.len(),
            ignored_refs: catalog.ignored.len(),
            commits,
            skipped_roots,
            anomalies,
            roots: summaries,
            elapsed_ms,
        })
    }
}
