use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use pawmatch_catalog::Catalog;
use pawmatch_logic::Truth;

/// How per-criterion weights are chosen during scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightMode {
    /// Weight each criterion by `|signed_score(user value)|`: criteria the
    /// user feels strongly about dominate.
    #[default]
    ConfidenceWeighted,
    /// Every supplied criterion weighs 1.
    Equal,
}

/// Per-criterion detail of one candidate's score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionContribution {
    /// Criterion id.
    pub criterion_id: String,
    /// The user's accumulated value.
    pub user: Truth,
    /// The candidate's derived value.
    pub candidate: Truth,
    /// `signed_score(user) * signed_score(candidate)`, in `[-1, 1]`.
    pub contribution: f32,
    /// Weight applied to the contribution.
    pub weight: f32,
}

/// One candidate's score with its per-criterion breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    /// Candidate id.
    pub candidate_id: String,
    /// Weighted mean contribution, in `[-1, 1]`.
    pub score: f32,
    /// Per-criterion breakdown, in criteria-vector order.
    pub breakdown: Vec<CriterionContribution>,
}

/// Scores and ranks candidates against a user criteria vector.
///
/// Agreement in sign between what the user wants and what the candidate has
/// yields positive contribution, disagreement negative; the candidate score
/// is the weighted mean over the supplied criteria. An empty vector (or zero
/// total weight) produces a defined neutral score of 0 for every candidate.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    catalog: Arc<Catalog>,
}

impl MatchEngine {
    /// Creates an engine over a shared catalog version.
    #[must_use]
    pub const fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// The catalog this engine scores against.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Detailed score of a single candidate, with per-criterion breakdown
    /// for explanation consumers.
    #[must_use]
    pub fn score_candidate(
        &self,
        candidate_id: &str,
        vector: &IndexMap<String, Truth>,
        mode: WeightMode,
    ) -> MatchResult {
        let mut breakdown = Vec::with_capacity(vector.len());
        let mut weighted_sum = 0.0_f32;
        let mut total_weight = 0.0_f32;

        for (criterion_id, user_value) in vector {
            let candidate_value = self.catalog.value(candidate_id, criterion_id);
            let user_score = user_value.signed_score();
            let contribution = user_score * candidate_value.signed_score();
            let weight = match mode {
                WeightMode::ConfidenceWeighted => user_score.abs(),
                WeightMode::Equal => 1.0,
            };
            weighted_sum += contribution * weight;
            total_weight += weight;
            breakdown.push(CriterionContribution {
                criterion_id: criterion_id.clone(),
                user: *user_value,
                candidate: candidate_value,
                contribution,
                weight,
            });
        }

        let score = if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            0.0
        };
        MatchResult {
            candidate_id: candidate_id.to_owned(),
            score,
            breakdown,
        }
    }

    /// Detailed ranking of all candidates: score descending, ties broken by
    /// candidate id ascending.
    #[must_use]
    pub fn rank(&self, vector: &IndexMap<String, Truth>, mode: WeightMode) -> Vec<MatchResult> {
        let mut results: Vec<MatchResult> = self
            .catalog
            .candidate_ids()
            .map(|candidate_id| self.score_candidate(candidate_id, vector, mode))
            .collect();
        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.candidate_id.cmp(&b.candidate_id))
        });
        results
    }

    /// Fast ranking path: `(candidate id, score)` pairs only, same ordering
    /// as [`MatchEngine::rank`]. Intended for repeated use inside question
    /// selection and progress displays.
    #[must_use]
    pub fn rank_fast(
        &self,
        vector: &IndexMap<String, Truth>,
        mode: WeightMode,
    ) -> Vec<(String, f32)> {
        let mut scores: Vec<(String, f32)> = self
            .catalog
            .candidate_ids()
            .map(|candidate_id| {
                (
                    candidate_id.to_owned(),
                    self.raw_score(candidate_id, vector, mode),
                )
            })
            .collect();
        scores.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scores
    }

    /// Unsorted scores aligned with the catalog's candidate order, for batch
    /// comparison by the selector.
    pub(crate) fn raw_scores(&self, vector: &IndexMap<String, Truth>, mode: WeightMode) -> Vec<f32> {
        self.catalog
            .candidate_ids()
            .map(|candidate_id| self.raw_score(candidate_id, vector, mode))
            .collect()
    }

    fn raw_score(
        &self,
        candidate_id: &str,
        vector: &IndexMap<String, Truth>,
        mode: WeightMode,
    ) -> f32 {
        let mut weighted_sum = 0.0_f32;
        let mut total_weight = 0.0_f32;
        for (criterion_id, user_value) in vector {
            let user_score = user_value.signed_score();
            let candidate_score = self.catalog.value(candidate_id, criterion_id).signed_score();
            let weight = match mode {
                WeightMode::ConfidenceWeighted => user_score.abs(),
                WeightMode::Equal => 1.0,
            };
            weighted_sum += user_score * candidate_score * weight;
            total_weight += weight;
        }
        if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            0.0
        }
    }
}
