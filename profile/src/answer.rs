use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pawmatch_logic::{Truth, UNKNOWN};

/// Errors surfaced at the profile boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// An answer kind outside the allowed set.
    #[error(
        "invalid answer kind `{given}` (expected one of: confirm, deny, unknown, indifferent)"
    )]
    InvalidAnswerKind {
        /// The rejected input.
        given: String,
    },
    /// A persisted record that cannot be reconstructed. Reconstruction is
    /// all-or-nothing: no partial profiles.
    #[error("corrupt evidence record: {reason}")]
    CorruptRecord {
        /// What failed the cross-check.
        reason: String,
    },
}

/// How the user answered a question about a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKind {
    /// Supports the criterion: contributes `(weight, 0)`.
    Confirm,
    /// Refutes the criterion: contributes `(0, weight)`.
    Deny,
    /// The user cannot say: records the ask without adding evidence.
    Unknown,
    /// The user does not care: the criterion leaves scoring entirely.
    Indifferent,
}

impl AnswerKind {
    /// Evidence contributed by this answer at the given weight.
    /// `Indifferent` contributes nothing (it clears instead).
    #[must_use]
    pub fn contribution(self, weight: f32) -> Truth {
        match self {
            Self::Confirm => Truth::new(weight, 0.0),
            Self::Deny => Truth::new(0.0, weight),
            Self::Unknown | Self::Indifferent => UNKNOWN,
        }
    }
}

impl fmt::Display for AnswerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirm => write!(f, "confirm"),
            Self::Deny => write!(f, "deny"),
            Self::Unknown => write!(f, "unknown"),
            Self::Indifferent => write!(f, "indifferent"),
        }
    }
}

impl FromStr for AnswerKind {
    type Err = ProfileError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "confirm" => Ok(Self::Confirm),
            "deny" => Ok(Self::Deny),
            "unknown" => Ok(Self::Unknown),
            "indifferent" => Ok(Self::Indifferent),
            other => Err(ProfileError::InvalidAnswerKind {
                given: other.to_owned(),
            }),
        }
    }
}

/// One entry of the append-only answer log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Criterion the question was about.
    pub criterion_id: String,
    /// Question variant that was asked, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    /// Answer kind.
    pub kind: AnswerKind,
    /// Confidence weight of the question in `[0, 1]`.
    pub weight: f32,
    /// When the answer was recorded.
    pub answered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_valid_kinds() {
        assert_eq!("confirm".parse::<AnswerKind>(), Ok(AnswerKind::Confirm));
        assert_eq!("deny".parse::<AnswerKind>(), Ok(AnswerKind::Deny));
        assert_eq!("unknown".parse::<AnswerKind>(), Ok(AnswerKind::Unknown));
        assert_eq!(
            "indifferent".parse::<AnswerKind>(),
            Ok(AnswerKind::Indifferent)
        );
    }

    #[test]
    fn rejects_anything_else_naming_the_allowed_set() {
        let err = "maybe".parse::<AnswerKind>().unwrap_err();
        assert_eq!(
            err,
            ProfileError::InvalidAnswerKind {
                given: "maybe".into()
            }
        );
        assert!(err.to_string().contains("confirm, deny, unknown, indifferent"));
    }

    #[test]
    fn contributions_follow_the_kind() {
        let confirm = AnswerKind::Confirm.contribution(0.8);
        assert!((confirm.t - 0.8).abs() < 1e-6);
        assert!(confirm.f.abs() < 1e-6);

        let deny = AnswerKind::Deny.contribution(0.8);
        assert!(deny.t.abs() < 1e-6);
        assert!((deny.f - 0.8).abs() < 1e-6);

        assert_eq!(AnswerKind::Unknown.contribution(1.0), UNKNOWN);
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&AnswerKind::Confirm).unwrap(),
            "\"confirm\""
        );
        assert!(serde_json::from_str::<AnswerKind>("\"sometimes\"").is_err());
    }
}
