use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use pawmatch_logic::Truth;

/// Whether a criterion is a hard constraint or a soft preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionCategory {
    /// Must-satisfy requirement (e.g. apartment compatibility).
    Constraint,
    /// Nice-to-have preference (e.g. playfulness).
    #[default]
    Preference,
}

/// Criterion definition as supplied by the content layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionSpec {
    /// Unique criterion id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Constraint vs. preference tag.
    #[serde(default)]
    pub category: CriterionCategory,
    /// Derivation formula; `None` marks a primitive criterion whose value
    /// comes directly from candidate data under the criterion id.
    #[serde(default)]
    pub formula: Option<String>,
}

/// Raw candidate data as supplied by the content layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Unique candidate id.
    pub id: String,
    /// Feature id to raw truth value.
    #[serde(default)]
    pub features: IndexMap<String, Truth>,
}

/// Complete catalog input: everything needed for one build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSource {
    /// All criterion definitions, in presentation order.
    pub criteria: Vec<CriterionSpec>,
    /// All candidates.
    pub candidates: Vec<CandidateRecord>,
    /// Every feature id any formula may reference; features a candidate does
    /// not carry default to UNKNOWN at evaluation time.
    #[serde(default)]
    pub feature_ids: Vec<String>,
}

impl CriterionSpec {
    /// Convenience constructor for a primitive criterion.
    #[must_use]
    pub fn primitive(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: CriterionCategory::default(),
            formula: None,
        }
    }

    /// Convenience constructor for a formula-derived criterion.
    #[must_use]
    pub fn derived(
        id: impl Into<String>,
        name: impl Into<String>,
        formula: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: CriterionCategory::default(),
            formula: Some(formula.into()),
        }
    }

    /// Sets the category tag.
    #[must_use]
    pub const fn with_category(mut self, category: CriterionCategory) -> Self {
        self.category = category;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawmatch_logic::TRUE;

    #[test]
    fn source_round_trips_through_json() {
        let source = CatalogSource {
            criteria: vec![
                CriterionSpec::primitive("calm", "Calm temperament"),
                CriterionSpec::derived(
                    "apartment_ok",
                    "Apartment compatible",
                    "small_size & ~barks_a_lot",
                )
                .with_category(CriterionCategory::Constraint),
            ],
            candidates: vec![CandidateRecord {
                id: "poodle".into(),
                features: [("small_size".to_owned(), TRUE)].into_iter().collect(),
            }],
            feature_ids: vec!["small_size".into(), "barks_a_lot".into()],
        };
        let json = serde_json::to_string(&source).unwrap();
        let back: CatalogSource = serde_json::from_str(&json).unwrap();
        assert_eq!(back.criteria.len(), 2);
        assert_eq!(back.criteria[1].category, CriterionCategory::Constraint);
        assert_eq!(back.candidates[0].features["small_size"], TRUE);
    }

    #[test]
    fn category_defaults_to_preference() {
        let spec: CriterionSpec =
            serde_json::from_str(r#"{"id": "calm", "name": "Calm"}"#).unwrap();
        assert_eq!(spec.category, CriterionCategory::Preference);
        assert!(spec.formula.is_none());
    }
}
