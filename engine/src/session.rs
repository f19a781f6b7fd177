use std::sync::Arc;

use indexmap::IndexSet;
use rand::{rngs::SmallRng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;

use pawmatch_catalog::Catalog;
use pawmatch_logging::Stage;
use pawmatch_profile::{AnswerKind, EvidenceProfile};

use crate::questions::{QuestionBank, QuestionVariant};
use crate::score::{MatchEngine, MatchResult, WeightMode};
use crate::select::{QuestionSelector, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::telemetry::SessionTelemetry;

/// Tunables of one interview session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Accumulated confidence at which a criterion counts as settled.
    pub confidence_threshold: f32,
    /// Split below which further questions cannot usefully change the
    /// outcome and the interview converges.
    pub min_split: f32,
    /// Weighting mode used for scoring and selection.
    pub mode: WeightMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            min_split: 0.01,
            mode: WeightMode::ConfidenceWeighted,
        }
    }
}

/// What the session wants to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum InterviewStep {
    /// Ask this question.
    Ask {
        /// Criterion the question probes.
        criterion_id: String,
        /// Chosen question variant.
        variant: QuestionVariant,
        /// Split quality that made this criterion the best pick.
        split: f32,
        /// Current accumulated confidence for the criterion.
        confidence: f32,
    },
    /// The best remaining split is below the configured minimum: more
    /// questions would not change the outcome.
    Converged {
        /// The best split that was still available.
        split: f32,
    },
    /// Every criterion is settled, indifferent or exhausted of variants.
    Done,
}

/// Interview state machine: wires a catalog, a profile and a question bank
/// together and drives answer → selection → answer rounds.
///
/// The session owns its profile exclusively (single-writer session state) and
/// performs no terminal I/O; callers render [`InterviewStep`]s however they
/// like and feed answers back in.
#[derive(Debug)]
pub struct InterviewSession {
    engine: MatchEngine,
    selector: QuestionSelector,
    profile: EvidenceProfile,
    bank: QuestionBank,
    config: SessionConfig,
    exhausted: IndexSet<String>,
    telemetry: Option<SessionTelemetry>,
    rng: SmallRng,
}

impl InterviewSession {
    /// Starts a fresh session over a shared catalog version.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, bank: QuestionBank, config: SessionConfig) -> Self {
        Self::resume(catalog, bank, config, EvidenceProfile::new())
    }

    /// Resumes a session from a previously persisted profile.
    #[must_use]
    pub fn resume(
        catalog: Arc<Catalog>,
        bank: QuestionBank,
        config: SessionConfig,
        profile: EvidenceProfile,
    ) -> Self {
        let engine = MatchEngine::new(catalog);
        let selector =
            QuestionSelector::new(engine.clone()).with_threshold(config.confidence_threshold);
        Self {
            engine,
            selector,
            profile,
            bank,
            config,
            exhausted: IndexSet::new(),
            telemetry: None,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Attaches a telemetry handle. Emission failures never interrupt the
    /// interview.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: SessionTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Decides the next step: the most discriminating question that still
    /// has an unasked variant, or a termination signal.
    ///
    /// A selected criterion whose variants are all spent is marked exhausted
    /// and selection retries without it.
    pub fn next_step(&mut self) -> InterviewStep {
        loop {
            let selection = self
                .selector
                .next(&self.profile, &self.exhausted, self.config.mode);
            let Some(criterion_id) = selection.criterion_id else {
                self.emit(Stage::SessionClosed, json!({ "reason": "done" }));
                return InterviewStep::Done;
            };
            if selection.split < self.config.min_split {
                self.emit(
                    Stage::SessionClosed,
                    json!({ "reason": "converged", "split": selection.split }),
                );
                return InterviewStep::Converged {
                    split: selection.split,
                };
            }
            if let Some(variant) = self.bank.pick(&criterion_id, &self.profile, &mut self.rng) {
                let variant = variant.clone();
                self.emit(
                    Stage::QuestionSelected,
                    json!({
                        "criterion": criterion_id,
                        "question": variant.id,
                        "split": selection.split,
                    }),
                );
                let confidence = self.profile.confidence(&criterion_id);
                return InterviewStep::Ask {
                    criterion_id,
                    variant,
                    split: selection.split,
                    confidence,
                };
            }
            self.exhausted.insert(criterion_id);
        }
    }

    /// Feeds an answer into the profile.
    pub fn answer(
        &mut self,
        criterion_id: &str,
        kind: AnswerKind,
        weight: f32,
        question_id: Option<&str>,
    ) {
        self.profile
            .add_answer(criterion_id, kind, weight, question_id);
        self.emit(
            Stage::AnswerRecorded,
            json!({
                "criterion": criterion_id,
                "kind": kind.to_string(),
                "weight": weight,
                "question": question_id,
            }),
        );
    }

    /// Current fast ranking, optionally truncated to the top `k`.
    #[must_use]
    pub fn rankings(&self, top_k: Option<usize>) -> Vec<(String, f32)> {
        let mut ranked = self
            .engine
            .rank_fast(&self.profile.criteria_vector(), self.config.mode);
        if let Some(k) = top_k {
            ranked.truncate(k);
        }
        self.emit(Stage::RankingComputed, json!({ "returned": ranked.len() }));
        ranked
    }

    /// Current detailed ranking with per-criterion breakdowns.
    #[must_use]
    pub fn detailed_rankings(&self) -> Vec<MatchResult> {
        self.engine
            .rank(&self.profile.criteria_vector(), self.config.mode)
    }

    /// The session's profile.
    #[must_use]
    pub const fn profile(&self) -> &EvidenceProfile {
        &self.profile
    }

    /// Consumes the session, handing the profile to the caller for
    /// persistence.
    #[must_use]
    pub fn into_profile(self) -> EvidenceProfile {
        self.profile
    }

    fn emit(&self, stage: Stage, detail: serde_json::Value) {
        if let Some(telemetry) = &self.telemetry {
            let _ = telemetry.emit(stage, detail);
        }
    }
}
