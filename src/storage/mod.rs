//! storage layer for gitsnap
//!
//! this module provides a read-only abstraction over git for the export.
//! The upper layers (ref catalog, attribution engine) use the `CommitSource`
//! trait and never touch git2 directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │           CommitSource (list refs, resolve, load)           │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                               │
//!                 ▼                               ▼
//!       ┌──────────────────┐            ┌──────────────────┐
//!       │  GitRepository   │            │ MemoryRepository │
//!       │    (libgit2)     │            │   (hand-built)   │
//!       └──────────────────┘            └──────────────────┘
//!                 │
//!        ┌────────┴────────┐
//!        ▼                 ▼
//!  ┌─────────────┐   ┌─────────────┐
//!  │    refs     │   │   commit    │
//!  │ (pinning)   │   │ (authorship)│
//!  └─────────────┘   └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use gitsnap::storage::{CommitSource, GitRepository, RefNamespace};
//!
//! let repo = GitRepository::open("./checkout")?;
//! for entry in repo.list_refs(RefNamespace::Tags)? {
//!     let commit = repo.get_commit(entry.target)?;
//!     println!("{} authored at {:?}", entry.name, commit.authored_at);
//! }
//! ```

mod commit;
mod errors;
mod memory;
mod refs;
mod repository;
mod source;
mod types;

// Re-export public API
pub use commit::{parse_author_time, CommitInfo};
pub use errors::{StorageError, StorageResult};
pub use memory::MemoryRepository;
pub use repository::GitRepository;
pub use source::CommitSource;
pub use types::{CommitId, InvalidNameError, RefEntry, RefNamespace};

pub(crate) use repository::default_repo_name;
