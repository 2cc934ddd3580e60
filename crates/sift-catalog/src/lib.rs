//! # sift-catalog
//!
//! The pattern store. Patterns live in SQLite; readers work against an
//! immutable [`CatalogSnapshot`] that is swapped wholesale after every write,
//! so a matcher never sees a half-applied change.

pub mod compiled;
pub mod evaluation;
pub mod snapshot;
pub mod store;
pub mod toml_catalog;
pub mod validation;

pub use compiled::CompiledPattern;
pub use snapshot::CatalogSnapshot;
pub use store::{PatternStore, ReloadReport};
pub use toml_catalog::{CatalogFile, TomlCatalogLoader};
