#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Read-only catalog of candidates: raw features plus criterion values
//! derived once at build time, shared immutably across sessions.

/// Catalog construction and read API.
pub mod catalog;
/// Atomic reload handle.
pub mod handle;
/// Content input records.
pub mod source;

pub use catalog::{Candidate, Catalog, CatalogError, Criterion, CriterionKind};
pub use handle::CatalogHandle;
pub use source::{CandidateRecord, CatalogSource, CriterionCategory, CriterionSpec};
