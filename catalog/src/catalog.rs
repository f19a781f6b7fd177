use indexmap::IndexMap;
use thiserror::Error;

use pawmatch_logic::{Formula, FormulaError, Truth, UNKNOWN};

use crate::source::{CatalogSource, CriterionCategory, CriterionSpec};

/// Errors raised while building a catalog. All of them are fatal: a catalog
/// either builds completely or not at all.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A criterion's formula failed to parse.
    #[error("criterion `{criterion_id}`: invalid formula `{formula}`: {source}")]
    Formula {
        /// Criterion owning the formula.
        criterion_id: String,
        /// Original formula text.
        formula: String,
        /// Underlying parse error.
        #[source]
        source: FormulaError,
    },
    /// Two criteria share an id.
    #[error("duplicate criterion id `{0}`")]
    DuplicateCriterion(String),
    /// Two candidates share an id.
    #[error("duplicate candidate id `{0}`")]
    DuplicateCandidate(String),
}

/// How a criterion's value is obtained for a candidate.
#[derive(Debug, Clone)]
pub enum CriterionKind {
    /// Value supplied directly by candidate data under the criterion id.
    Primitive,
    /// Value derived by evaluating a formula over features and earlier
    /// criteria.
    Derived(Formula),
}

/// A fully loaded criterion.
#[derive(Debug, Clone)]
pub struct Criterion {
    /// Unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Constraint vs. preference tag.
    pub category: CriterionCategory,
    /// Primitive or formula-derived.
    pub kind: CriterionKind,
}

/// A candidate with its raw features and the derived criterion row.
#[derive(Debug, Clone)]
pub struct Candidate {
    id: String,
    features: IndexMap<String, Truth>,
    derived: IndexMap<String, Truth>,
}

impl Candidate {
    /// Candidate id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw feature value, UNKNOWN when the candidate does not carry it.
    #[must_use]
    pub fn feature(&self, feature_id: &str) -> Truth {
        self.features.get(feature_id).copied().unwrap_or(UNKNOWN)
    }
}

/// Immutable precomputed matrix of candidate × criterion truth values.
///
/// Built once from a [`CatalogSource`]; afterwards it is read-only and may be
/// shared across any number of concurrent sessions behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Catalog {
    criteria: IndexMap<String, Criterion>,
    candidates: IndexMap<String, Candidate>,
}

impl Catalog {
    /// Builds the catalog: validates every formula, then derives every
    /// criterion value for every candidate.
    ///
    /// Criteria are evaluated in declaration order and each derived value is
    /// inserted back into the evaluation environment, so a formula may
    /// reference any criterion declared before it. Features and criteria
    /// absent from the environment evaluate to UNKNOWN.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Formula`] naming the criterion and formula text when a
    /// formula fails to parse; duplicate-id errors for repeated criterion or
    /// candidate ids.
    pub fn build(source: &CatalogSource) -> Result<Self, CatalogError> {
        let mut criteria: IndexMap<String, Criterion> = IndexMap::new();
        for spec in &source.criteria {
            let criterion = load_criterion(spec)?;
            if criteria.insert(spec.id.clone(), criterion).is_some() {
                return Err(CatalogError::DuplicateCriterion(spec.id.clone()));
            }
        }

        let mut candidates: IndexMap<String, Candidate> = IndexMap::new();
        for record in &source.candidates {
            let mut env: IndexMap<String, Truth> = source
                .feature_ids
                .iter()
                .map(|id| (id.clone(), UNKNOWN))
                .collect();
            for (feature_id, value) in &record.features {
                env.insert(feature_id.clone(), *value);
            }

            let mut derived = IndexMap::with_capacity(criteria.len());
            for criterion in criteria.values() {
                let value = match &criterion.kind {
                    CriterionKind::Primitive => {
                        env.get(&criterion.id).copied().unwrap_or(UNKNOWN)
                    }
                    CriterionKind::Derived(formula) => formula.eval(&env),
                };
                env.insert(criterion.id.clone(), value);
                derived.insert(criterion.id.clone(), value);
            }

            let candidate = Candidate {
                id: record.id.clone(),
                features: record.features.clone(),
                derived,
            };
            if candidates.insert(record.id.clone(), candidate).is_some() {
                return Err(CatalogError::DuplicateCandidate(record.id.clone()));
            }
        }

        Ok(Self {
            criteria,
            candidates,
        })
    }

    /// Derived truth value for a candidate/criterion pair.
    ///
    /// Unknown candidate or criterion ids yield UNKNOWN rather than an error,
    /// keeping scoring robust to schema drift between content and code.
    #[must_use]
    pub fn value(&self, candidate_id: &str, criterion_id: &str) -> Truth {
        self.candidates
            .get(candidate_id)
            .and_then(|candidate| candidate.derived.get(criterion_id))
            .copied()
            .unwrap_or(UNKNOWN)
    }

    /// Looks up a criterion definition.
    #[must_use]
    pub fn criterion(&self, criterion_id: &str) -> Option<&Criterion> {
        self.criteria.get(criterion_id)
    }

    /// Looks up a candidate.
    #[must_use]
    pub fn candidate(&self, candidate_id: &str) -> Option<&Candidate> {
        self.candidates.get(candidate_id)
    }

    /// Criterion ids in declaration order.
    pub fn criterion_ids(&self) -> impl Iterator<Item = &str> {
        self.criteria.keys().map(String::as_str)
    }

    /// Candidate ids in declaration order.
    pub fn candidate_ids(&self) -> impl Iterator<Item = &str> {
        self.candidates.keys().map(String::as_str)
    }

    /// Criterion definitions in declaration order.
    pub fn criteria(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.values()
    }

    /// Number of candidates.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Number of criteria.
    #[must_use]
    pub fn criterion_count(&self) -> usize {
        self.criteria.len()
    }

    /// True when the catalog holds no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

fn load_criterion(spec: &CriterionSpec) -> Result<Criterion, CatalogError> {
    let kind = match &spec.formula {
        None => CriterionKind::Primitive,
        Some(text) => {
            let formula = Formula::parse(text).map_err(|source| CatalogError::Formula {
                criterion_id: spec.id.clone(),
                formula: text.clone(),
                source,
            })?;
            CriterionKind::Derived(formula)
        }
    };
    Ok(Criterion {
        id: spec.id.clone(),
        name: spec.name.clone(),
        category: spec.category,
        kind,
    })
}
