use indexmap::{IndexMap, IndexSet};

use pawmatch_logic::{Truth, FALSE, TRUE};
use pawmatch_profile::EvidenceProfile;

use crate::score::{MatchEngine, WeightMode};

/// Outcome of one selection round.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Criterion to ask about next; `None` when no askable criteria remain.
    pub criterion_id: Option<String>,
    /// Split quality of the chosen criterion, 0 when nothing is askable.
    ///
    /// A value below the caller's epsilon means no further question can
    /// usefully change the ranking — the interview's natural end, not an
    /// error.
    pub split: f32,
}

/// Greedy next-question chooser.
///
/// For every askable criterion the selector simulates both resolutions —
/// forced canonical TRUE and forced canonical FALSE — scores all candidates
/// under each, and measures the split as the mean absolute difference of the
/// mean-centered score vectors. The criterion with the largest split
/// discriminates most, a cheap proxy for information gain that needs no
/// probabilistic answer model.
#[derive(Debug, Clone)]
pub struct QuestionSelector {
    engine: MatchEngine,
    confidence_threshold: f32,
}

/// Accumulated confidence at which a criterion counts as settled and stops
/// being asked about. Mirrors the content configuration's high threshold.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.8;

impl QuestionSelector {
    /// Creates a selector with the default confidence threshold.
    #[must_use]
    pub const fn new(engine: MatchEngine) -> Self {
        Self {
            engine,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// Overrides the settled-criterion confidence threshold.
    #[must_use]
    pub const fn with_threshold(mut self, confidence_threshold: f32) -> Self {
        self.confidence_threshold = confidence_threshold;
        self
    }

    /// The underlying match engine.
    #[must_use]
    pub const fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    /// Picks the criterion whose resolution would most change the ranking.
    ///
    /// Settled criteria are skipped: indifferent ones, those whose
    /// accumulated confidence has reached the threshold, and those in
    /// `excluded` (the caller adds criteria exhausted of question variants
    /// there). A weakly answered criterion stays askable so further variants
    /// can firm it up. Candidates are examined in ascending id order and only
    /// a strictly larger split replaces the incumbent, so equal splits
    /// resolve to the lexicographically smallest criterion id.
    #[must_use]
    pub fn next(
        &self,
        profile: &EvidenceProfile,
        excluded: &IndexSet<String>,
        mode: WeightMode,
    ) -> Selection {
        let vector = profile.criteria_vector();
        let mut best: Option<(String, f32)> = None;
        for criterion_id in self.askable(profile, excluded) {
            let split = self.split_quality(&vector, &criterion_id, mode);
            match &best {
                Some((_, best_split)) if split <= *best_split => {}
                _ => best = Some((criterion_id, split)),
            }
        }
        best.map_or(
            Selection {
                criterion_id: None,
                split: 0.0,
            },
            |(criterion_id, split)| Selection {
                criterion_id: Some(criterion_id),
                split,
            },
        )
    }

    /// Ranks every askable criterion by split quality, descending, ties by
    /// criterion id ascending.
    #[must_use]
    pub fn rank_questions(
        &self,
        profile: &EvidenceProfile,
        excluded: &IndexSet<String>,
        mode: WeightMode,
    ) -> Vec<(String, f32)> {
        let vector = profile.criteria_vector();
        let mut rankings: Vec<(String, f32)> = self
            .askable(profile, excluded)
            .into_iter()
            .map(|criterion_id| {
                let split = self.split_quality(&vector, &criterion_id, mode);
                (criterion_id, split)
            })
            .collect();
        rankings.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rankings
    }

    /// Split quality of a single criterion against the given vector: mean
    /// per-candidate divergence between its forced-TRUE and forced-FALSE
    /// resolutions, after removing each resolution's uniform shift.
    ///
    /// Both score vectors are centered on their own mean before differencing.
    /// A criterion every candidate satisfies identically moves all scores by
    /// the same amount under either resolution — it cannot reorder anything,
    /// and centering makes its split exactly 0 instead of rewarding the
    /// shift.
    #[must_use]
    pub fn split_quality(
        &self,
        vector: &IndexMap<String, Truth>,
        criterion_id: &str,
        mode: WeightMode,
    ) -> f32 {
        let candidate_count = self.engine.catalog().candidate_count();
        if candidate_count == 0 {
            return 0.0;
        }

        let mut forced = vector.clone();
        forced.insert(criterion_id.to_owned(), TRUE);
        let scores_true = self.engine.raw_scores(&forced, mode);
        forced.insert(criterion_id.to_owned(), FALSE);
        let scores_false = self.engine.raw_scores(&forced, mode);

        #[allow(clippy::cast_precision_loss)]
        let count = candidate_count as f32;
        let mean_true: f32 = scores_true.iter().sum::<f32>() / count;
        let mean_false: f32 = scores_false.iter().sum::<f32>() / count;
        let total: f32 = scores_true
            .iter()
            .zip(&scores_false)
            .map(|(a, b)| ((a - mean_true) - (b - mean_false)).abs())
            .sum();
        total / count
    }

    /// Askable criterion ids in ascending order: not indifferent, not yet at
    /// the confidence threshold, not excluded by the caller.
    fn askable(&self, profile: &EvidenceProfile, excluded: &IndexSet<String>) -> Vec<String> {
        let mut ids: Vec<String> = self
            .engine
            .catalog()
            .criterion_ids()
            .filter(|id| {
                !profile.is_indifferent(id)
                    && profile.confidence(id) < self.confidence_threshold
                    && !excluded.contains(*id)
            })
            .map(ToOwned::to_owned)
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use pawmatch_catalog::{CandidateRecord, Catalog, CatalogSource, CriterionSpec};
    use pawmatch_profile::AnswerKind;

    const EPS: f32 = 1e-6;

    fn features(pairs: &[(&str, Truth)]) -> IndexMap<String, Truth> {
        pairs
            .iter()
            .map(|(id, value)| ((*id).to_owned(), *value))
            .collect()
    }

    /// Two candidates that differ only on `divisive` and agree on `shared`.
    fn selector() -> QuestionSelector {
        let source = CatalogSource {
            criteria: vec![
                CriterionSpec::primitive("divisive", "Divisive"),
                CriterionSpec::primitive("shared", "Shared"),
            ],
            candidates: vec![
                CandidateRecord {
                    id: "alpha".into(),
                    features: features(&[("divisive", TRUE), ("shared", TRUE)]),
                },
                CandidateRecord {
                    id: "bravo".into(),
                    features: features(&[("divisive", FALSE), ("shared", TRUE)]),
                },
            ],
            feature_ids: vec!["divisive".into(), "shared".into()],
        };
        let catalog = Arc::new(Catalog::build(&source).unwrap());
        QuestionSelector::new(MatchEngine::new(catalog))
    }

    #[test]
    fn discriminating_criterion_beats_shared_one() {
        let sel = selector();
        let profile = EvidenceProfile::new();
        let empty = IndexSet::new();

        let vector = profile.criteria_vector();
        let divisive = sel.split_quality(&vector, "divisive", WeightMode::Equal);
        let shared = sel.split_quality(&vector, "shared", WeightMode::Equal);
        assert!(divisive > shared);
        assert!(shared.abs() < EPS);

        let selection = sel.next(&profile, &empty, WeightMode::Equal);
        assert_eq!(selection.criterion_id.as_deref(), Some("divisive"));
        assert!(selection.split > 0.0);
    }

    #[test]
    fn settled_criteria_are_skipped() {
        let sel = selector();
        let mut profile = EvidenceProfile::new();
        // Full-weight confirmation: confidence 1.0, past the threshold.
        profile.add_answer("divisive", AnswerKind::Confirm, 1.0, None);
        let selection = sel.next(&profile, &IndexSet::new(), WeightMode::Equal);
        assert_eq!(selection.criterion_id.as_deref(), Some("shared"));
    }

    #[test]
    fn weakly_answered_criteria_stay_askable() {
        let sel = selector();
        let mut profile = EvidenceProfile::new();
        // Confidence 0.3 stays below the 0.8 threshold: the criterion can be
        // probed again with another question variant.
        profile.add_answer("divisive", AnswerKind::Confirm, 0.3, None);
        let selection = sel.next(&profile, &IndexSet::new(), WeightMode::Equal);
        assert_eq!(selection.criterion_id.as_deref(), Some("divisive"));
    }

    #[test]
    fn indifferent_criteria_are_skipped() {
        let sel = selector();
        let mut profile = EvidenceProfile::new();
        profile.add_answer("divisive", AnswerKind::Indifferent, 1.0, None);
        let selection = sel.next(&profile, &IndexSet::new(), WeightMode::Equal);
        assert_eq!(selection.criterion_id.as_deref(), Some("shared"));
    }

    #[test]
    fn exhausted_everything_returns_no_more_questions() {
        let sel = selector();
        let mut profile = EvidenceProfile::new();
        profile.add_answer("divisive", AnswerKind::Confirm, 1.0, None);
        let excluded: IndexSet<String> = ["shared".to_owned()].into_iter().collect();
        let selection = sel.next(&profile, &excluded, WeightMode::Equal);
        assert_eq!(selection.criterion_id, None);
        assert!(selection.split.abs() < EPS);
    }

    #[test]
    fn equal_splits_resolve_to_smallest_criterion_id() {
        // Both criteria split the candidates identically.
        let source = CatalogSource {
            criteria: vec![
                CriterionSpec::primitive("zeta", "Zeta"),
                CriterionSpec::primitive("alpha_trait", "Alpha trait"),
            ],
            candidates: vec![
                CandidateRecord {
                    id: "one".into(),
                    features: features(&[("zeta", TRUE), ("alpha_trait", TRUE)]),
                },
                CandidateRecord {
                    id: "two".into(),
                    features: features(&[("zeta", FALSE), ("alpha_trait", FALSE)]),
                },
            ],
            feature_ids: vec!["zeta".into(), "alpha_trait".into()],
        };
        let sel = QuestionSelector::new(MatchEngine::new(Arc::new(
            Catalog::build(&source).unwrap(),
        )));
        let selection = sel.next(&EvidenceProfile::new(), &IndexSet::new(), WeightMode::Equal);
        assert_eq!(selection.criterion_id.as_deref(), Some("alpha_trait"));
    }

    #[test]
    fn question_rankings_are_sorted_and_complete() {
        let sel = selector();
        let rankings =
            sel.rank_questions(&EvidenceProfile::new(), &IndexSet::new(), WeightMode::Equal);
        assert_eq!(rankings.len(), 2);
        assert_eq!(rankings[0].0, "divisive");
        assert!(rankings[0].1 >= rankings[1].1);
    }
}
