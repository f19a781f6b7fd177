use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pawmatch_logic::Truth;

use crate::answer::{AnswerRecord, ProfileError};
use crate::profile::EvidenceProfile;

/// Tolerance for cross-checking replayed floats against stored ones.
const CHECK_EPS: f32 = 1e-5;

/// Plain persistence record of an [`EvidenceProfile`].
///
/// The core is indifferent to the storage medium; this is the complete
/// structured form a storage layer serializes and hands back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Session id.
    pub session_id: Uuid,
    /// Ordered answer log, oldest first.
    pub answers: Vec<AnswerRecord>,
    /// Derived accumulated value per criterion.
    pub values: IndexMap<String, Truth>,
    /// Derived accumulated weight per criterion.
    pub weights: IndexMap<String, f32>,
    /// Criteria marked "don't care".
    pub indifferent: Vec<String>,
    /// Question ids already asked.
    pub asked_questions: Vec<String>,
}

impl EvidenceProfile {
    /// Snapshots the profile into its persistence record.
    #[must_use]
    pub fn to_record(&self) -> ProfileRecord {
        ProfileRecord {
            session_id: self.session_id(),
            answers: self.answers().to_vec(),
            values: self.criteria_vector(),
            weights: self.weights().clone(),
            indifferent: self.indifferent().iter().cloned().collect(),
            asked_questions: self.asked_questions().iter().cloned().collect(),
        }
    }

    /// Reconstructs a profile from a persistence record.
    ///
    /// The answer log is replayed from empty and the result is cross-checked
    /// against the record's stored derived state. Any mismatch, non-finite
    /// number or out-of-range truth component fails the whole reconstruction:
    /// partial profiles are never produced.
    ///
    /// # Errors
    ///
    /// [`ProfileError::CorruptRecord`] naming the first failed check.
    pub fn from_record(record: ProfileRecord) -> Result<Self, ProfileError> {
        validate_record(&record)?;

        let mut profile = Self::with_session(record.session_id);
        for answer in record.answers {
            profile.push_record(answer);
        }

        cross_check(&profile, &record.values, &record.weights)?;

        let stored_indifferent: IndexSet<String> = record.indifferent.into_iter().collect();
        if profile.indifferent() != &stored_indifferent {
            return Err(corrupt("indifferent set does not match the answer log"));
        }
        let stored_asked: IndexSet<String> = record.asked_questions.into_iter().collect();
        if profile.asked_questions() != &stored_asked {
            return Err(corrupt("asked-question set does not match the answer log"));
        }
        Ok(profile)
    }
}

fn validate_record(record: &ProfileRecord) -> Result<(), ProfileError> {
    for answer in &record.answers {
        if !answer.weight.is_finite() || !(0.0..=1.0).contains(&answer.weight) {
            return Err(corrupt(format!(
                "answer for `{}` has weight {} outside [0, 1]",
                answer.criterion_id, answer.weight
            )));
        }
    }
    for (criterion_id, value) in &record.values {
        if !component_ok(value.t) || !component_ok(value.f) {
            return Err(corrupt(format!(
                "stored value for `{criterion_id}` has components outside [0, 1]"
            )));
        }
    }
    for (criterion_id, weight) in &record.weights {
        if !weight.is_finite() || *weight < 0.0 {
            return Err(corrupt(format!(
                "stored weight for `{criterion_id}` is invalid"
            )));
        }
    }
    Ok(())
}

fn cross_check(
    profile: &EvidenceProfile,
    stored_values: &IndexMap<String, Truth>,
    stored_weights: &IndexMap<String, f32>,
) -> Result<(), ProfileError> {
    let replayed = profile.criteria_vector();
    if replayed.len() != stored_values.len() {
        return Err(corrupt("stored values do not match the answer log"));
    }
    for (criterion_id, stored) in stored_values {
        let Some(value) = replayed.get(criterion_id) else {
            return Err(corrupt(format!(
                "stored value for `{criterion_id}` missing from replay"
            )));
        };
        if (value.t - stored.t).abs() > CHECK_EPS || (value.f - stored.f).abs() > CHECK_EPS {
            return Err(corrupt(format!(
                "stored value for `{criterion_id}` disagrees with the answer log"
            )));
        }
    }
    if stored_weights.len() != profile.weights().len() {
        return Err(corrupt("stored weights do not match the answer log"));
    }
    for (criterion_id, stored) in stored_weights {
        let weight = profile.total_weight(criterion_id);
        if (weight - stored).abs() > CHECK_EPS {
            return Err(corrupt(format!(
                "stored weight for `{criterion_id}` disagrees with the answer log"
            )));
        }
    }
    Ok(())
}

fn component_ok(component: f32) -> bool {
    component.is_finite() && (0.0..=1.0).contains(&component)
}

fn corrupt(reason: impl Into<String>) -> ProfileError {
    ProfileError::CorruptRecord {
        reason: reason.into(),
    }
}
