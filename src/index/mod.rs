//! Cluster membership index
//!
//! Inverts the clustered wordlist once per analysis run:
//!
//! - cognate cluster id -> member forms
//! - borrowing cluster id -> member forms
//! - language -> concept -> forms (what the calculator scans per subset)
//!
//! Forms without a cluster id appear in no bucket of the corresponding map.
//! Construction is a single pass over the corpus.

use crate::models::{ConceptId, Form, LanguageId};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::debug;

/// Read-only lookup structure over a clustered corpus
#[derive(Debug, Clone, Default)]
pub struct ClusterIndex {
    forms: Vec<Form>,
    by_cognate: FxHashMap<String, Vec<usize>>,
    by_borrowing: FxHashMap<String, Vec<usize>>,
    by_language: FxHashMap<LanguageId, FxHashMap<ConceptId, Vec<usize>>>,
    concepts: BTreeSet<ConceptId>,
}

/// Build the index from a flat sequence of forms.
pub fn build_cluster_index<I>(forms: I) -> ClusterIndex
where
    I: IntoIterator<Item = Form>,
{
    ClusterIndex::build(forms)
}

impl ClusterIndex {
    pub fn build<I>(forms: I) -> Self
    where
        I: IntoIterator<Item = Form>,
    {
        let forms: Vec<Form> = forms.into_iter().collect();
        let mut by_cognate: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        let mut by_borrowing: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        let mut by_language: FxHashMap<LanguageId, FxHashMap<ConceptId, Vec<usize>>> =
            FxHashMap::default();
        let mut concepts = BTreeSet::new();

        for (idx, form) in forms.iter().enumerate() {
            if let Some(cogid) = &form.cognate_id {
                by_cognate.entry(cogid.clone()).or_default().push(idx);
            }
            if let Some(borid) = &form.borrowing_id {
                by_borrowing.entry(borid.clone()).or_default().push(idx);
            }
            by_language
                .entry(form.language_id.clone())
                .or_default()
                .entry(form.concept_id.clone())
                .or_default()
                .push(idx);
            if !concepts.contains(&form.concept_id) {
                concepts.insert(form.concept_id.clone());
            }
        }

        debug!(
            "Indexed {} forms: {} cognate clusters, {} borrowing clusters, {} languages, {} concepts",
            forms.len(),
            by_cognate.len(),
            by_borrowing.len(),
            by_language.len(),
            concepts.len()
        );

        Self {
            forms,
            by_cognate,
            by_borrowing,
            by_language,
            concepts,
        }
    }

    /// All indexed forms, in corpus order
    pub fn forms(&self) -> &[Form] {
        &self.forms
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Members of a cognate cluster (empty for unknown ids)
    pub fn cognate_cluster<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Form> + 'a {
        self.members(self.by_cognate.get(id))
    }

    /// Members of a borrowing cluster (empty for unknown ids)
    pub fn borrowing_cluster<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Form> + 'a {
        self.members(self.by_borrowing.get(id))
    }

    /// Iterate `(borrowing id, members)` pairs in arbitrary order
    pub fn borrowing_clusters(&self) -> impl Iterator<Item = (&str, Vec<&Form>)> + '_ {
        self.by_borrowing
            .iter()
            .map(|(id, idxs)| (id.as_str(), idxs.iter().map(|&i| &self.forms[i]).collect()))
    }

    /// Size of the form's cognate cluster; 0 when unassigned
    pub fn cognate_size(&self, form: &Form) -> usize {
        form.cognate_id
            .as_deref()
            .and_then(|id| self.by_cognate.get(id))
            .map_or(0, Vec::len)
    }

    /// Size of the form's borrowing cluster; 0 when unassigned
    pub fn borrowing_size(&self, form: &Form) -> usize {
        form.borrowing_id
            .as_deref()
            .and_then(|id| self.by_borrowing.get(id))
            .map_or(0, Vec::len)
    }

    /// Forms a language attests for a concept
    pub fn forms_for<'a>(
        &'a self,
        language: &str,
        concept: &str,
    ) -> impl ExactSizeIterator<Item = &'a Form> + 'a {
        let idxs: &[usize] = self
            .by_language
            .get(language)
            .and_then(|by_concept| by_concept.get(concept))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        idxs.iter().map(move |&i| &self.forms[i])
    }

    /// Language ids that attest at least one form
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.by_language.keys().map(String::as_str)
    }

    /// Every concept attested in the corpus, sorted
    pub fn concepts(&self) -> impl Iterator<Item = &str> {
        self.concepts.iter().map(String::as_str)
    }

    pub fn has_concept(&self, concept: &str) -> bool {
        self.concepts.contains(concept)
    }

    pub fn cognate_cluster_count(&self) -> usize {
        self.by_cognate.len()
    }

    pub fn borrowing_cluster_count(&self) -> usize {
        self.by_borrowing.len()
    }

    fn members<'a>(&'a self, idxs: Option<&'a Vec<usize>>) -> impl Iterator<Item = &'a Form> + 'a {
        idxs.into_iter()
            .flat_map(|v| v.iter())
            .map(move |&i| &self.forms[i])
    }
}
