use chrono::Utc;
use indexmap::{IndexMap, IndexSet};
use uuid::Uuid;

use pawmatch_logic::Truth;

use crate::answer::{AnswerKind, AnswerRecord};

/// Per-session accumulation of user answers into a criteria vector.
///
/// The profile is single-writer session state: it carries no internal
/// synchronization and must be exclusively owned by whichever context is
/// mutating it. All derived state (values, weights, indifferent set, asked
/// set) is exactly reproducible by replaying the answer log from empty,
/// in order — [`EvidenceProfile::recompute_vector`] does exactly that, and
/// the incremental path applies answers through the same routine.
#[derive(Debug, Clone)]
pub struct EvidenceProfile {
    session_id: Uuid,
    answers: Vec<AnswerRecord>,
    values: IndexMap<String, Truth>,
    weights: IndexMap<String, f32>,
    counts: IndexMap<String, u32>,
    indifferent: IndexSet<String>,
    asked: IndexSet<String>,
}

impl EvidenceProfile {
    /// Creates an empty profile with a fresh session id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_session(Uuid::new_v4())
    }

    /// Creates an empty profile bound to an existing session id.
    #[must_use]
    pub fn with_session(session_id: Uuid) -> Self {
        Self {
            session_id,
            answers: Vec::new(),
            values: IndexMap::new(),
            weights: IndexMap::new(),
            counts: IndexMap::new(),
            indifferent: IndexSet::new(),
            asked: IndexSet::new(),
        }
    }

    /// Session id this profile belongs to.
    #[must_use]
    pub const fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Records an answer and folds it into the accumulated state.
    ///
    /// Confirm contributes `(weight, 0)`, deny `(0, weight)`, unknown
    /// nothing; repeated non-indifferent answers to the same criterion pool
    /// via evidence accumulation, never overwrite — contradictory answers
    /// drive the value toward CONFLICT, not back to UNKNOWN. Indifferent
    /// discards the criterion's accumulated value and weight and excludes it
    /// from scoring until a later non-indifferent answer clears the flag.
    /// The question id, when supplied, joins the asked set regardless of
    /// kind. Weights are clamped to `[0, 1]`.
    pub fn add_answer(
        &mut self,
        criterion_id: &str,
        kind: AnswerKind,
        weight: f32,
        question_id: Option<&str>,
    ) {
        let record = AnswerRecord {
            criterion_id: criterion_id.to_owned(),
            question_id: question_id.map(ToOwned::to_owned),
            kind,
            weight: weight.clamp(0.0, 1.0),
            answered_at: Utc::now(),
        };
        self.apply(&record);
        self.answers.push(record);
    }

    /// Appends a pre-existing log record verbatim (timestamps preserved) and
    /// folds it into the accumulated state. Used when restoring a profile.
    pub(crate) fn push_record(&mut self, record: AnswerRecord) {
        self.apply(&record);
        self.answers.push(record);
    }

    /// Clears all derived state and replays the answer log in order.
    ///
    /// Produces state identical to the incrementally built one for any log.
    pub fn recompute_vector(&mut self) {
        self.values.clear();
        self.weights.clear();
        self.counts.clear();
        self.indifferent.clear();
        self.asked.clear();
        let log = std::mem::take(&mut self.answers);
        for record in &log {
            self.apply(record);
        }
        self.answers = log;
    }

    fn apply(&mut self, record: &AnswerRecord) {
        if let Some(question_id) = &record.question_id {
            self.asked.insert(question_id.clone());
        }
        match record.kind {
            AnswerKind::Indifferent => {
                self.indifferent.insert(record.criterion_id.clone());
                self.values.shift_remove(&record.criterion_id);
                self.weights.shift_remove(&record.criterion_id);
            }
            kind => {
                self.indifferent.shift_remove(&record.criterion_id);
                let contribution = kind.contribution(record.weight);
                let slot = self
                    .values
                    .entry(record.criterion_id.clone())
                    .or_default();
                *slot = slot.accumulate(contribution);
                *self
                    .weights
                    .entry(record.criterion_id.clone())
                    .or_insert(0.0) += record.weight;
                *self.counts.entry(record.criterion_id.clone()).or_insert(0) += 1;
            }
        }
    }

    /// Current criteria vector for matching: accumulated values of every
    /// non-indifferent answered criterion.
    #[must_use]
    pub fn criteria_vector(&self) -> IndexMap<String, Truth> {
        self.values.clone()
    }

    /// Accumulated value for one criterion, `None` when unset or indifferent.
    #[must_use]
    pub fn value(&self, criterion_id: &str) -> Option<Truth> {
        self.values.get(criterion_id).copied()
    }

    /// Confidence of the accumulated value, `0.0` when unset.
    ///
    /// Callers use this to decide when a criterion is settled enough to stop
    /// asking about it.
    #[must_use]
    pub fn confidence(&self, criterion_id: &str) -> f32 {
        self.values
            .get(criterion_id)
            .map_or(0.0, |value| value.confidence())
    }

    /// Total weight of all questions answered for this criterion.
    #[must_use]
    pub fn total_weight(&self, criterion_id: &str) -> f32 {
        self.weights.get(criterion_id).copied().unwrap_or(0.0)
    }

    /// How many evidence-bearing answers the criterion has received.
    #[must_use]
    pub fn answer_count(&self, criterion_id: &str) -> u32 {
        self.counts.get(criterion_id).copied().unwrap_or(0)
    }

    /// True when the user marked the criterion "don't care".
    #[must_use]
    pub fn is_indifferent(&self, criterion_id: &str) -> bool {
        self.indifferent.contains(criterion_id)
    }

    /// True when the criterion has a value or is marked indifferent.
    #[must_use]
    pub fn is_set(&self, criterion_id: &str) -> bool {
        self.values.contains_key(criterion_id) || self.indifferent.contains(criterion_id)
    }

    /// True when the question variant has already been asked.
    #[must_use]
    pub fn was_asked(&self, question_id: &str) -> bool {
        self.asked.contains(question_id)
    }

    /// Ids of all answered criteria, indifferent ones included.
    #[must_use]
    pub fn answered_ids(&self) -> IndexSet<String> {
        self.values
            .keys()
            .chain(self.indifferent.iter())
            .cloned()
            .collect()
    }

    /// The indifferent-criteria set.
    #[must_use]
    pub const fn indifferent(&self) -> &IndexSet<String> {
        &self.indifferent
    }

    /// The asked-question-id set.
    #[must_use]
    pub const fn asked_questions(&self) -> &IndexSet<String> {
        &self.asked
    }

    /// Full answer log, oldest first.
    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    /// Accumulated weights per criterion.
    #[must_use]
    pub const fn weights(&self) -> &IndexMap<String, f32> {
        &self.weights
    }

    /// Resets the profile to its initial empty state, keeping the session id.
    pub fn clear(&mut self) {
        self.answers.clear();
        self.values.clear();
        self.weights.clear();
        self.counts.clear();
        self.indifferent.clear();
        self.asked.clear();
    }
}

impl Default for EvidenceProfile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawmatch_logic::TruthState;

    const EPS: f32 = 1e-6;

    #[test]
    fn confirm_sets_supporting_evidence() {
        let mut profile = EvidenceProfile::new();
        profile.add_answer("apartment_ok", AnswerKind::Confirm, 1.0, Some("apt_q1"));
        let value = profile.value("apartment_ok").unwrap();
        assert!((value.t - 1.0).abs() < EPS);
        assert!(value.f.abs() < EPS);
        assert!(profile.was_asked("apt_q1"));
        assert!((profile.total_weight("apartment_ok") - 1.0).abs() < EPS);
    }

    #[test]
    fn confirm_then_deny_moves_toward_conflict_not_unknown() {
        let mut profile = EvidenceProfile::new();
        profile.add_answer("calm", AnswerKind::Confirm, 0.6, None);
        profile.add_answer("calm", AnswerKind::Deny, 0.6, None);
        let value = profile.value("calm").unwrap();
        assert!((value.t - value.f).abs() < EPS);
        assert!(value.t > 0.0);
        assert_eq!(value.classify(), TruthState::Conflict);
    }

    #[test]
    fn consistent_answers_accumulate() {
        let mut profile = EvidenceProfile::new();
        profile.add_answer("hypoallergenic", AnswerKind::Confirm, 0.5, Some("q1"));
        profile.add_answer("hypoallergenic", AnswerKind::Confirm, 0.4, Some("q2"));
        let value = profile.value("hypoallergenic").unwrap();
        assert!((value.t - 0.9).abs() < EPS);
        assert_eq!(profile.answer_count("hypoallergenic"), 2);
        assert!((profile.total_weight("hypoallergenic") - 0.9).abs() < EPS);
    }

    #[test]
    fn unknown_records_the_ask_without_evidence() {
        let mut profile = EvidenceProfile::new();
        profile.add_answer("guard_role", AnswerKind::Unknown, 0.7, Some("guard_q1"));
        let value = profile.value("guard_role").unwrap();
        assert!(value.t.abs() < EPS && value.f.abs() < EPS);
        assert!(profile.was_asked("guard_q1"));
        assert!((profile.confidence("guard_role")).abs() < EPS);
    }

    #[test]
    fn indifferent_discards_and_excludes() {
        let mut profile = EvidenceProfile::new();
        profile.add_answer("guard_role", AnswerKind::Confirm, 1.0, Some("q1"));
        profile.add_answer("guard_role", AnswerKind::Indifferent, 1.0, Some("q2"));
        assert!(profile.value("guard_role").is_none());
        assert!(profile.is_indifferent("guard_role"));
        assert!(profile.criteria_vector().is_empty());
        assert!((profile.total_weight("guard_role")).abs() < EPS);
        // Both question ids stay asked.
        assert!(profile.was_asked("q1") && profile.was_asked("q2"));
    }

    #[test]
    fn later_answer_clears_the_indifferent_flag() {
        let mut profile = EvidenceProfile::new();
        profile.add_answer("guard_role", AnswerKind::Indifferent, 1.0, None);
        profile.add_answer("guard_role", AnswerKind::Deny, 0.8, None);
        assert!(!profile.is_indifferent("guard_role"));
        let value = profile.value("guard_role").unwrap();
        assert!((value.f - 0.8).abs() < EPS);
    }

    #[test]
    fn replay_matches_incremental_state() {
        let mut profile = EvidenceProfile::new();
        profile.add_answer("a", AnswerKind::Confirm, 0.9, Some("a1"));
        profile.add_answer("b", AnswerKind::Deny, 0.4, Some("b1"));
        profile.add_answer("a", AnswerKind::Deny, 0.3, Some("a2"));
        profile.add_answer("c", AnswerKind::Indifferent, 1.0, Some("c1"));
        profile.add_answer("b", AnswerKind::Confirm, 0.4, None);

        let values_before = profile.criteria_vector();
        let weights_before = profile.weights().clone();
        let indifferent_before = profile.indifferent().clone();
        let asked_before = profile.asked_questions().clone();

        profile.recompute_vector();

        assert_eq!(profile.criteria_vector(), values_before);
        assert_eq!(profile.weights(), &weights_before);
        assert_eq!(profile.indifferent(), &indifferent_before);
        assert_eq!(profile.asked_questions(), &asked_before);
    }

    #[test]
    fn weight_is_clamped_into_unit_range() {
        let mut profile = EvidenceProfile::new();
        profile.add_answer("calm", AnswerKind::Confirm, 4.2, None);
        let value = profile.value("calm").unwrap();
        assert!((value.t - 1.0).abs() < EPS);
        assert!((profile.total_weight("calm") - 1.0).abs() < EPS);
    }
}
