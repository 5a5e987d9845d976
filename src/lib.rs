//! seabor - lexical admixture analysis
//!
//! Splits each language variety's vocabulary into inherited, singleton and
//! cross-family borrowed shares from precomputed cognate and borrowing
//! clusters, and tests with a permutation test whether a concept list is
//! more resistant to borrowing than the rest of the vocabulary.
//!
//! ```no_run
//! use seabor::{build_cluster_index, compute_admixture, dataset};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let forms = dataset::load_forms(Path::new("forms.csv"))?;
//! let languages = dataset::languages_from_forms(&forms);
//! let index = build_cluster_index(forms);
//! let concepts: Vec<String> = index.concepts().map(str::to_string).collect();
//! let records = compute_admixture(&index, &languages, &concepts)?;
//! # Ok(())
//! # }
//! ```

pub mod admixture;
pub mod config;
pub mod dataset;
pub mod error;
pub mod index;
pub mod models;
pub mod reporters;
pub mod significance;

pub use admixture::{compute_admixture, AdmixtureCalculator, AdmixtureOptions, ProportionRecord};
pub use error::{AnalysisError, AnalysisResult};
pub use index::{build_cluster_index, ClusterIndex};
pub use models::{ConceptSubset, Form, Language};
pub use significance::{permutation_test, score_subset, PermutationResult, PermutationTester};
