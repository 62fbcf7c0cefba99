//! Commit attribution.
//!
//! Partitions the commit DAG across the catalog's roots: each commit is
//! recorded once, under the first root (in processing order) that reaches
//! it. Releases are processed before branches, so a branch only ever claims
//! history no release reaches.
//!
//! # Usage
//!
//! ```ignore
//! use gitsnap::attribution::AttributionEngine;
//! use gitsnap::catalog::{RefCatalog, ReleasePattern};
//!
//! let catalog = RefCatalog::load(&repo, &ReleasePattern::default())?;
//! let run = AttributionEngine::new(&repo).run(&catalog.releases, &catalog.branches);
//! for attribution in &run.attributions {
//!     println!("{} {}", attribution.commit.short(), attribution.claimed_by);
//! }
//! ```

mod anomaly;
mod engine;
mod frontier;
mod types;

pub use anomaly::Anomaly;
pub use engine::AttributionEngine;
pub use frontier::{ClaimCache, ClaimState, FrontierRoot};
pub use types::{Attribution, AttributionRun, Phase, RootOutcome, RootSummary};
