use std::fmt;
use std::ops::{Add, BitAnd, BitOr, Not};

use serde::{Deserialize, Serialize};

/// Evidence-based truth value: independent support for (`t`) and against
/// (`f`) a proposition, each in `[0, 1]`.
///
/// The four canonical points are [`TRUE`], [`FALSE`], [`UNKNOWN`] and
/// [`CONFLICT`]; everything in between expresses partial or contradictory
/// evidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Truth {
    /// Accumulated support for the proposition.
    pub t: f32,
    /// Accumulated support against the proposition.
    pub f: f32,
}

/// Fully confirmed: `(1, 0)`.
pub const TRUE: Truth = Truth { t: 1.0, f: 0.0 };
/// Fully denied: `(0, 1)`.
pub const FALSE: Truth = Truth { t: 0.0, f: 1.0 };
/// No evidence either way: `(0, 0)`.
pub const UNKNOWN: Truth = Truth { t: 0.0, f: 0.0 };
/// Full evidence both ways: `(1, 1)`.
pub const CONFLICT: Truth = Truth { t: 1.0, f: 1.0 };

/// Dominant state of a truth value after decomposing it into four
/// orthogonal weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruthState {
    /// Contradictory evidence dominates.
    Conflict,
    /// Supporting evidence dominates.
    True,
    /// Refuting evidence dominates.
    False,
    /// Absence of evidence dominates.
    Unknown,
}

impl fmt::Display for TruthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict => write!(f, "conflict"),
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl Truth {
    /// Creates a truth value, clamping both components into `[0, 1]`.
    #[must_use]
    pub fn new(t: f32, f: f32) -> Self {
        Self {
            t: t.clamp(0.0, 1.0),
            f: f.clamp(0.0, 1.0),
        }
    }

    /// Logical negation: swaps support for and against.
    #[must_use]
    pub const fn negate(self) -> Self {
        Self {
            t: self.f,
            f: self.t,
        }
    }

    /// Logical conjunction: `(min t, max f)`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self {
            t: self.t.min(other.t),
            f: self.f.max(other.f),
        }
    }

    /// Logical disjunction: `(max t, min f)`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            t: self.t.max(other.t),
            f: self.f.min(other.f),
        }
    }

    /// Material implication: `!self | other`.
    #[must_use]
    pub fn implies(self, other: Self) -> Self {
        self.negate().or(other)
    }

    /// Bi-implication: `(self -> other) & (other -> self)`.
    #[must_use]
    pub fn iff(self, other: Self) -> Self {
        self.implies(other).and(other.implies(self))
    }

    /// Pools independent observations of the *same* proposition by saturating
    /// addition of both components.
    ///
    /// This is not a logical connective and must never be used to combine
    /// different propositions. It is commutative, associative and has
    /// [`UNKNOWN`] as identity; contradictory observations drive the value
    /// toward [`CONFLICT`], never back toward [`UNKNOWN`].
    #[must_use]
    pub fn accumulate(self, other: Self) -> Self {
        Self {
            t: (self.t + other.t).min(1.0),
            f: (self.f + other.f).min(1.0),
        }
    }

    /// Net support in `[-1, 1]`: positive means more confirmed than denied.
    #[must_use]
    pub const fn signed_score(self) -> f32 {
        self.t - self.f
    }

    /// How much evidence exists at all: `1 - (1-t)(1-f)`, `0` for
    /// [`UNKNOWN`], approaching `1` as evidence accumulates either way.
    #[must_use]
    pub fn confidence(self) -> f32 {
        (self.f).mul_add(1.0 - self.t, self.t).clamp(0.0, 1.0)
    }

    /// Classifies the value into its dominant state.
    ///
    /// The value decomposes into four non-negative weights — truth `t(1-f)`,
    /// falsity `f(1-t)`, unknown `(1-t)(1-f)` and conflict `t*f` — and the
    /// largest wins. Ties resolve by priority conflict > truth > falsity >
    /// unknown.
    #[must_use]
    pub fn classify(self) -> TruthState {
        let weights = [
            (self.t * self.f, TruthState::Conflict),
            (self.t * (1.0 - self.f), TruthState::True),
            (self.f * (1.0 - self.t), TruthState::False),
            ((1.0 - self.t) * (1.0 - self.f), TruthState::Unknown),
        ];
        let mut best = weights[0];
        for candidate in &weights[1..] {
            if candidate.0 > best.0 {
                best = *candidate;
            }
        }
        best.1
    }
}

impl Default for Truth {
    fn default() -> Self {
        UNKNOWN
    }
}

impl fmt::Display for Truth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(t={:.2}, f={:.2})", self.t, self.f)
    }
}

impl Not for Truth {
    type Output = Self;

    fn not(self) -> Self {
        self.negate()
    }
}

impl BitAnd for Truth {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

impl BitOr for Truth {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

impl Add for Truth {
    type Output = Self;

    /// Evidence accumulation, see [`Truth::accumulate`].
    fn add(self, rhs: Self) -> Self {
        self.accumulate(rhs)
    }
}
