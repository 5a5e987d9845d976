//! Admixture proportions per language variety
//!
//! For a selected concept subset, every form a language attests is put in
//! one origin category:
//!
//! ```text
//! borrowing cluster spans >= 2 families  -> "Fam-A--Fam-B"  (cross-family)
//! else cognate cluster has > 1 member    -> own family label
//! else                                   -> "singleton"
//! no form for the concept at all         -> "missing"
//! ```
//!
//! Borrowing is checked first, so detected lateral transfer overrides
//! vertical inheritance. A language with `n` forms for one concept gives
//! each form a weight of `1/n`; the concept as a whole counts once towards
//! the denominator, exactly like a missing concept does.

use crate::error::{AnalysisError, AnalysisResult};
use crate::index::ClusterIndex;
use crate::models::{ConceptId, ConceptSubset, Form, Language, LanguageId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};


/// Label of concepts a language has no form for
pub const MISSING: &str = "missing";

/// Label of forms without shared inheritance or shared borrowing
pub const SINGLETON: &str = "singleton";

/// Joins the families of a cross-family label
pub const FAMILY_SEPARATOR: &str = "--";

/// Which families make up a cross-family label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CrossFamilyLabel {
    /// Every family of the borrowing cluster, the scored language's included
    #[default]
    AllMembers,
    /// The cluster's families minus the scored language's own family
    ExcludeOwn,
}

impl std::str::FromStr for CrossFamilyLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "all-members" | "all" => Ok(CrossFamilyLabel::AllMembers),
            "exclude-own" => Ok(CrossFamilyLabel::ExcludeOwn),
            _ => Err(anyhow::anyhow!(
                "Unknown cross-family label mode '{}'. Valid modes: all-members, exclude-own",
                s
            )),
        }
    }
}

/// Knobs of the calculator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdmixtureOptions {
    pub cross_family_label: CrossFamilyLabel,
}

/// Origin category of one scored form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Missing,
    Singleton,
    /// Shared inheritance within the language's own family
    Family(String),
    /// Shared borrowing; sorted, de-duplicated family labels
    CrossFamily(Vec<String>),
}

impl Category {
    pub fn label(&self) -> String {
        match self {
            Category::Missing => MISSING.to_string(),
            Category::Singleton => SINGLETON.to_string(),
            Category::Family(family) => family.clone(),
            Category::CrossFamily(families) => families.join(FAMILY_SEPARATOR),
        }
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self, Category::CrossFamily(_))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Category shares of one language for one concept subset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProportionRecord {
    pub language_id: LanguageId,
    pub family: String,
    #[serde(default)]
    pub subgroup: Option<String>,
    /// Concepts with at least one attested form
    pub scored: usize,
    /// Concepts without any form
    pub missing: usize,
    /// Category label -> share of the subset; sums to 1.0 when `has_data()`
    pub shares: BTreeMap<String, f64>,
}

impl ProportionRecord {
    /// Denominator of every share
    pub fn total(&self) -> usize {
        self.scored + self.missing
    }

    /// False for the degenerate "no data" record (empty `shares`)
    pub fn has_data(&self) -> bool {
        self.total() > 0
    }

    /// Share of a category label, 0.0 when the label never occurred
    pub fn share(&self, label: &str) -> f64 {
        self.shares.get(label).copied().unwrap_or(0.0)
    }

    pub fn sum(&self) -> f64 {
        self.shares.values().sum()
    }

    /// Share of the subset covered by cross-family borrowings.
    ///
    /// Anything that is neither missing, singleton nor the own family is
    /// borrowed, which holds under both label modes.
    pub fn borrowed_share(&self) -> f64 {
        self.shares
            .iter()
            .filter(|(label, _)| {
                label.as_str() != MISSING
                    && label.as_str() != SINGLETON
                    && label.as_str() != self.family
            })
            .map(|(_, share)| share)
            .sum()
    }

    /// Fraction of attested evidence that is not borrowed; `None` when the
    /// language attests nothing in the subset.
    pub fn non_borrowed_share(&self) -> Option<f64> {
        if self.scored == 0 {
            return None;
        }
        let attested = 1.0 - self.share(MISSING);
        Some((self.share(SINGLETON) + self.share(&self.family)) / attested)
    }
}

/// Records of every language for one subset, with report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmixtureTable {
    pub subset: String,
    pub concept_count: usize,
    /// Ordered category columns: missing, singleton, families, cross-family labels
    pub categories: Vec<String>,
    /// Sorted by family, subgroup and language id
    pub records: Vec<ProportionRecord>,
}

impl AdmixtureTable {
    pub fn get(&self, language: &str) -> Option<&ProportionRecord> {
        self.records.iter().find(|r| r.language_id == language)
    }

    pub fn into_map(self) -> BTreeMap<LanguageId, ProportionRecord> {
        self.records
            .into_iter()
            .map(|r| (r.language_id.clone(), r))
            .collect()
    }

    /// Language-averaged non-borrowed share over languages with data
    pub fn mean_non_borrowed(&self) -> Option<f64> {
        let values: Vec<f64> = self
            .records
            .iter()
            .filter_map(ProportionRecord::non_borrowed_share)
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Shared, read-only classification context.
///
/// Built once per run from the index and the language set; reused for every
/// subset and every permutation replicate.
#[derive(Debug)]
pub struct AdmixtureCalculator<'a> {
    index: &'a ClusterIndex,
    languages: Vec<&'a Language>,
    families: FxHashMap<&'a str, &'a str>,
    /// Borrowing cluster id -> its families, only for multi-family clusters
    cross_family: FxHashMap<&'a str, Vec<&'a str>>,
    options: AdmixtureOptions,
}

impl<'a> AdmixtureCalculator<'a> {
    /// Build the calculator, failing on forms of unknown languages.
    pub fn new(
        index: &'a ClusterIndex,
        languages: &'a [Language],
        options: AdmixtureOptions,
    ) -> AnalysisResult<Self> {
        let mut families: FxHashMap<&'a str, &'a str> = FxHashMap::default();
        let mut ordered = Vec::with_capacity(languages.len());
        for language in languages {
            if families.contains_key(language.id.as_str()) {
                warn!("Duplicate language '{}' ignored", language.id);
                continue;
            }
            families.insert(language.id.as_str(), language.family.as_str());
            ordered.push(language);
        }

        if let Some(orphan) = index
            .forms()
            .iter()
            .find(|f| !families.contains_key(f.language_id.as_str()))
        {
            return Err(AnalysisError::DataIntegrity {
                form_id: orphan.id.clone(),
                language_id: orphan.language_id.clone(),
            });
        }

        let mut cross_family: FxHashMap<&'a str, Vec<&'a str>> = FxHashMap::default();
        for (borid, members) in index.borrowing_clusters() {
            if members.len() < 2 {
                continue;
            }
            let spanned: BTreeSet<&'a str> = members
                .iter()
                .filter_map(|f| families.get(f.language_id.as_str()).copied())
                .filter(|family| !family.is_empty())
                .collect();
            if spanned.len() >= 2 {
                cross_family.insert(borid, spanned.into_iter().collect());
            }
        }

        debug!(
            "Admixture calculator: {} languages, {} of {} borrowing clusters span families",
            ordered.len(),
            cross_family.len(),
            index.borrowing_cluster_count()
        );

        Ok(Self {
            index,
            languages: ordered,
            families,
            cross_family,
            options,
        })
    }

    pub fn index(&self) -> &'a ClusterIndex {
        self.index
    }

    pub fn languages(&self) -> &[&'a Language] {
        &self.languages
    }

    pub fn options(&self) -> AdmixtureOptions {
        self.options
    }

    /// Family of a language id, empty for unknown ids
    pub fn family_of(&self, language: &str) -> &'a str {
        self.families.get(language).copied().unwrap_or("")
    }

    /// True when the form belongs to a borrowing cluster spanning families
    pub fn is_cross_family(&self, form: &Form) -> bool {
        form.borrowing_id
            .as_deref()
            .is_some_and(|id| self.cross_family.contains_key(id))
    }

    /// Categorize one attested form
    pub fn classify(&self, form: &Form) -> Category {
        let own_family = self.family_of(&form.language_id);

        if let Some(spanned) = form
            .borrowing_id
            .as_deref()
            .and_then(|id| self.cross_family.get(id))
        {
            let families = spanned
                .iter()
                .filter(|family| match self.options.cross_family_label {
                    CrossFamilyLabel::AllMembers => true,
                    CrossFamilyLabel::ExcludeOwn => **family != own_family,
                })
                .map(|family| family.to_string())
                .collect();
            return Category::CrossFamily(families);
        }

        if self.index.cognate_size(form) > 1 {
            Category::Family(own_family.to_string())
        } else {
            Category::Singleton
        }
    }

    /// Proportion record of one language over a sorted, de-duplicated subset
    pub fn language_record(&self, language: &Language, concepts: &[ConceptId]) -> ProportionRecord {
        let mut weights: BTreeMap<String, f64> = BTreeMap::new();
        let mut scored = 0;
        let mut missing = 0;

        for concept in concepts {
            let forms = self.index.forms_for(&language.id, concept);
            let n = forms.len();
            if n == 0 {
                missing += 1;
                continue;
            }
            scored += 1;
            let unit = 1.0 / n as f64;
            for form in forms {
                *weights.entry(self.classify(form).label()).or_insert(0.0) += unit;
            }
        }
        if missing > 0 {
            weights.insert(MISSING.to_string(), missing as f64);
        }

        let total = scored + missing;
        let shares = if total == 0 {
            BTreeMap::new()
        } else {
            weights
                .into_iter()
                .map(|(label, weight)| (label, weight / total as f64))
                .collect()
        };

        ProportionRecord {
            language_id: language.id.clone(),
            family: language.family.clone(),
            subgroup: language.subgroup.clone(),
            scored,
            missing,
            shares,
        }
    }

    /// Fraction of a language's attested evidence that is not cross-family
    /// borrowed. `None` when nothing in the subset is attested.
    ///
    /// Allocation-free twin of `ProportionRecord::non_borrowed_share`, used
    /// by the permutation loop.
    pub fn non_borrowed_fraction<S: AsRef<str>>(&self, language: &str, concepts: &[S]) -> Option<f64> {
        let mut kept = 0.0;
        let mut scored = 0usize;
        for concept in concepts {
            let forms = self.index.forms_for(language, concept.as_ref());
            let n = forms.len();
            if n == 0 {
                continue;
            }
            scored += 1;
            let unit = 1.0 / n as f64;
            for form in forms {
                if !self.is_cross_family(form) {
                    kept += unit;
                }
            }
        }
        (scored > 0).then(|| kept / scored as f64)
    }

    /// Compute the admixture table of a subset.
    pub fn compute(&self, subset: &ConceptSubset) -> AnalysisResult<AdmixtureTable> {
        if subset.is_empty() {
            return Err(AnalysisError::InvalidArgument(format!(
                "concept subset '{}' is empty",
                subset.name
            )));
        }
        // ConceptSubset keeps its ids sorted and unique; re-normalize anyway
        // for subsets assembled by hand.
        let normalized = ConceptSubset::from_concepts(subset.name.clone(), subset.concepts.iter().cloned());

        let unattested = normalized
            .concepts
            .iter()
            .filter(|c| !self.index.has_concept(c))
            .count();
        if unattested > 0 {
            debug!(
                "{} of {} concepts in '{}' are not attested in the corpus",
                unattested,
                normalized.len(),
                normalized.name
            );
        }

        let mut records: Vec<ProportionRecord> = self
            .languages
            .iter()
            .map(|language| self.language_record(language, &normalized.concepts))
            .collect();
        records.sort_by(|a, b| {
            (&a.family, &a.subgroup, &a.language_id).cmp(&(&b.family, &b.subgroup, &b.language_id))
        });

        Ok(AdmixtureTable {
            subset: normalized.name.clone(),
            concept_count: normalized.len(),
            categories: category_columns(&records),
            records,
        })
    }
}

/// Column order for reports: missing, singleton, single labels, then
/// cross-family labels by number of families.
pub fn category_columns(records: &[ProportionRecord]) -> Vec<String> {
    let mut labels: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        labels.extend(record.shares.keys().map(String::as_str));
    }
    labels.remove(MISSING);
    labels.remove(SINGLETON);

    let mut rest: Vec<&str> = labels.into_iter().collect();
    rest.sort_by_key(|label| (label.matches(FAMILY_SEPARATOR).count(), *label));

    let mut columns = vec![MISSING.to_string(), SINGLETON.to_string()];
    columns.extend(rest.into_iter().map(str::to_string));
    columns
}

/// Compute every language's proportion record for a concept subset.
///
/// Fails with `InvalidArgument` on an empty subset and with
/// `DataIntegrity` when a form references an unknown language.
pub fn compute_admixture(
    index: &ClusterIndex,
    languages: &[Language],
    concept_subset: &[ConceptId],
) -> AnalysisResult<BTreeMap<LanguageId, ProportionRecord>> {
    if concept_subset.is_empty() {
        return Err(AnalysisError::InvalidArgument(
            "concept subset is empty".to_string(),
        ));
    }
    let calculator = AdmixtureCalculator::new(index, languages, AdmixtureOptions::default())?;
    let subset = ConceptSubset::from_concepts("subset", concept_subset.iter().cloned());
    Ok(calculator.compute(&subset)?.into_map())
}
