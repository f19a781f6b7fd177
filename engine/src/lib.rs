#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Scoring, ranking and adaptive question selection over a catalog, plus the
//! interview session state machine that ties them to a user profile.

/// Question variants per criterion.
pub mod questions;
/// Match scoring and ranking.
pub mod score;
/// Greedy split-quality question selection.
pub mod select;
/// Interview session orchestration.
pub mod session;
/// Session telemetry hook.
pub mod telemetry;

pub use questions::{QuestionBank, QuestionVariant};
pub use score::{CriterionContribution, MatchEngine, MatchResult, WeightMode};
pub use select::{QuestionSelector, Selection, DEFAULT_CONFIDENCE_THRESHOLD};
pub use session::{InterviewSession, InterviewStep, SessionConfig};
pub use telemetry::SessionTelemetry;
