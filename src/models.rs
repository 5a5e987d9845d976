//! Core data models for Seabor
//!
//! These models describe the clustered wordlist handed over by the
//! ingestion layer: attested forms, the language varieties they belong to,
//! and the concept subsets an analysis is scoped to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier of a language variety (doculect)
pub type LanguageId = String;

/// Identifier of a concept (meaning slot)
pub type ConceptId = String;

/// Identifier of a cognate or borrowing cluster
pub type ClusterId = String;

/// One attested word for one (language, concept) pair.
///
/// Cluster memberships are `None` when the upstream clustering left the form
/// unassigned. Historical zero markers never reach this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Form {
    pub id: String,
    pub language_id: LanguageId,
    /// Copied from the language for fast filtering; categorization always
    /// goes through the language table.
    #[serde(default)]
    pub family: String,
    pub concept_id: ConceptId,
    #[serde(default)]
    pub cognate_id: Option<ClusterId>,
    #[serde(default)]
    pub borrowing_id: Option<ClusterId>,
}

impl Form {
    pub fn new(
        id: impl Into<String>,
        language_id: impl Into<String>,
        family: impl Into<String>,
        concept_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            language_id: language_id.into(),
            family: family.into(),
            concept_id: concept_id.into(),
            cognate_id: None,
            borrowing_id: None,
        }
    }

    /// Set the cognate cluster
    pub fn with_cognate(mut self, cognate_id: impl Into<String>) -> Self {
        self.cognate_id = Some(cognate_id.into());
        self
    }

    /// Set the borrowing (xenolog) cluster
    pub fn with_borrowing(mut self, borrowing_id: impl Into<String>) -> Self {
        self.borrowing_id = Some(borrowing_id.into());
        self
    }
}

/// A language variety with its genealogical placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Language {
    pub id: LanguageId,
    #[serde(default)]
    pub name: Option<String>,
    pub family: String,
    #[serde(default)]
    pub subgroup: Option<String>,
    /// Only used by map rendering downstream
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Language {
    pub fn new(id: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            family: family.into(),
            ..Default::default()
        }
    }

    pub fn with_subgroup(mut self, subgroup: impl Into<String>) -> Self {
        self.subgroup = Some(subgroup.into());
        self
    }
}

/// A named selection of concepts scoping one computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptSubset {
    pub name: String,
    pub concepts: Vec<ConceptId>,
}

impl ConceptSubset {
    /// Build a subset, dropping duplicate ids and sorting the rest
    pub fn from_concepts<I, S>(name: impl Into<String>, concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ConceptId>,
    {
        let unique: BTreeSet<ConceptId> = concepts.into_iter().map(Into::into).collect();
        Self {
            name: name.into(),
            concepts: unique.into_iter().collect(),
        }
    }

    /// The "All items" subset over a universe
    pub fn all<I, S>(universe: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ConceptId>,
    {
        Self::from_concepts("All items", universe)
    }

    /// Concepts of `universe` that are not in this subset
    pub fn complement(&self, universe: &[ConceptId]) -> Self {
        let own: BTreeSet<&str> = self.concepts.iter().map(String::as_str).collect();
        Self::from_concepts(
            format!("!= {}", self.name),
            universe.iter().filter(|c| !own.contains(c.as_str())).cloned(),
        )
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn contains(&self, concept: &str) -> bool {
        self.concepts.binary_search_by(|c| c.as_str().cmp(concept)).is_ok()
    }
}
