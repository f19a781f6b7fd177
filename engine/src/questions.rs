use indexmap::IndexMap;
use rand::{rngs::SmallRng, Rng};
use serde::{Deserialize, Serialize};

use pawmatch_profile::EvidenceProfile;

/// One phrasing of a question about a criterion.
///
/// Several variants may probe the same criterion with different confidence
/// weights (a direct question weighs more than an indirect one); each variant
/// is asked at most once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionVariant {
    /// Unique variant id.
    pub id: String,
    /// Question text shown to the user.
    pub text: String,
    /// Confidence weight of an answer to this variant, in `(0, 1]`.
    #[serde(default = "default_weight")]
    pub weight: f32,
}

const fn default_weight() -> f32 {
    1.0
}

/// Question variants grouped by criterion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionBank {
    entries: IndexMap<String, Vec<QuestionVariant>>,
}

impl QuestionBank {
    /// Creates an empty bank.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variant for a criterion.
    pub fn add(&mut self, criterion_id: impl Into<String>, variant: QuestionVariant) {
        self.entries.entry(criterion_id.into()).or_default().push(variant);
    }

    /// All variants for a criterion, in insertion order.
    #[must_use]
    pub fn variants(&self, criterion_id: &str) -> &[QuestionVariant] {
        self.entries
            .get(criterion_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Variants for a criterion not yet asked in the given profile.
    #[must_use]
    pub fn unasked<'a>(
        &'a self,
        criterion_id: &str,
        profile: &EvidenceProfile,
    ) -> Vec<&'a QuestionVariant> {
        self.variants(criterion_id)
            .iter()
            .filter(|variant| !profile.was_asked(&variant.id))
            .collect()
    }

    /// True when every variant for the criterion has been asked (or none
    /// exist at all) — the criterion cannot be probed further this session.
    #[must_use]
    pub fn is_exhausted(&self, criterion_id: &str, profile: &EvidenceProfile) -> bool {
        self.unasked(criterion_id, profile).is_empty()
    }

    /// Picks a random unasked variant for the criterion.
    #[must_use]
    pub fn pick<'a>(
        &'a self,
        criterion_id: &str,
        profile: &EvidenceProfile,
        rng: &mut SmallRng,
    ) -> Option<&'a QuestionVariant> {
        let open = self.unasked(criterion_id, profile);
        if open.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..open.len());
        Some(open[index])
    }

    /// Criterion ids that have at least one variant.
    pub fn criterion_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use pawmatch_profile::AnswerKind;

    fn variant(id: &str, weight: f32) -> QuestionVariant {
        QuestionVariant {
            id: id.into(),
            text: format!("question {id}"),
            weight,
        }
    }

    fn bank() -> QuestionBank {
        let mut bank = QuestionBank::new();
        bank.add("hypoallergenic", variant("hypo_q1", 0.95));
        bank.add("hypoallergenic", variant("hypo_q2", 0.4));
        bank
    }

    #[test]
    fn pick_never_repeats_an_asked_variant() {
        let bank = bank();
        let mut profile = EvidenceProfile::new();
        let mut rng = SmallRng::seed_from_u64(7);

        let first = bank.pick("hypoallergenic", &profile, &mut rng).unwrap().clone();
        profile.add_answer("hypoallergenic", AnswerKind::Confirm, first.weight, Some(&first.id));

        let second = bank.pick("hypoallergenic", &profile, &mut rng).unwrap().clone();
        assert_ne!(first.id, second.id);
        profile.add_answer("hypoallergenic", AnswerKind::Confirm, second.weight, Some(&second.id));

        assert!(bank.pick("hypoallergenic", &profile, &mut rng).is_none());
        assert!(bank.is_exhausted("hypoallergenic", &profile));
    }

    #[test]
    fn unknown_criterion_is_exhausted_by_definition() {
        let bank = bank();
        assert!(bank.is_exhausted("no_such", &EvidenceProfile::new()));
    }

    #[test]
    fn weight_defaults_to_one_when_omitted() {
        let parsed: QuestionVariant =
            serde_json::from_str(r#"{"id": "q1", "text": "Lives in a flat?"}"#).unwrap();
        assert!((parsed.weight - 1.0).abs() < 1e-6);
    }

    #[test]
    fn bank_round_trips_as_a_plain_map() {
        let json = serde_json::to_string(&bank()).unwrap();
        let back: QuestionBank = serde_json::from_str(&json).unwrap();
        assert_eq!(back.variants("hypoallergenic").len(), 2);
    }
}
