#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Per-session user state: answers accumulate into a criteria vector via
//! four-valued evidence pooling, with a replayable append-only log.

/// Answer kinds, log records and profile errors.
pub mod answer;
/// Evidence accumulation.
pub mod profile;
/// Plain persistence record.
pub mod record;

pub use answer::{AnswerKind, AnswerRecord, ProfileError};
pub use profile::EvidenceProfile;
pub use record::ProfileRecord;
