#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Four-valued evidence logic: truth values with independent support
//! for/against, and a static formula language evaluated over them.

/// Formula parsing and evaluation.
pub mod formula;
/// Truth value type and operators.
pub mod truth;

pub use formula::{Expr, Formula, FormulaError};
pub use truth::{Truth, TruthState, CONFLICT, FALSE, TRUE, UNKNOWN};
