//! Snapshot sinks.
//!
//! An export run writes one snapshot: the branches and releases that were
//! roots, then every attributed commit with its parent edges. Each record
//! carries the snapshot id, so repeated runs over the same repository never
//! collide.
//!
//! - [`SqliteSink`] keeps snapshots in a SQLite database, one transaction
//!   per batch.
//! - [`JsonLinesSink`] streams records as JSON lines.
//! - [`MemorySink`] holds everything in memory.

mod error;
mod jsonl;
mod memory;
mod schema;
mod sqlite;
mod traits;
mod types;

pub use error::{SinkError, SinkResult};
pub use jsonl::JsonLinesSink;
pub use memory::{MemorySink, MemorySnapshot};
pub use schema::SCHEMA;
pub use sqlite::SqliteSink;
pub use traits::SnapshotSink;
pub use types::{BranchRecord, ReleaseRecord, SnapshotId, SnapshotTotals};
