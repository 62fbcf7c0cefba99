//! gitsnap - commit attribution snapshots for git repositories
//!
//! Every commit reachable from a release tag or branch head is attributed
//! to exactly one of them: releases first, then branches, each in order of
//! the authorship time of the commit they point at. The result is written
//! as a snapshot to SQLite, JSON lines, or memory.
//!
//! # Example
//!
//! ```no_run
//! use gitsnap::export::{ExportConfig, Exporter};
//! use gitsnap::sink::MemorySink;
//!
//! let exporter = Exporter::open(ExportConfig::new("./mpo-ui")).unwrap();
//! let mut sink = MemorySink::new();
//! let summary = exporter.export(&mut sink).unwrap();
//! println!("{} commits in snapshot {}", summary.commits, summary.snapshot_id);
//! ```

pub mod attribution;
pub mod catalog;
pub mod export;
pub mod sink;
pub mod storage;
