//! Ref catalog.
//!
//! Splits the repository's refs into releases (names like `web@1.4.2`) and
//! branches, each ordered by the authorship time of the commit it points at.
//! The attribution engine processes roots in exactly this order.

mod error;
mod manager;
mod pattern;
mod types;

pub use error::{CatalogError, CatalogResult};
pub use manager::RefCatalog;
pub use pattern::{ReleasePattern, ReleaseVersion};
pub use types::{Branch, Release};
