//! Permutation test for borrowing differences between concept subsets
//!
//! The statistic is the language-averaged share of attested evidence that is
//! not cross-family borrowed. For two subsets A and B the observed
//! difference `score(A) - score(B)` is compared against replicates where A'
//! is a uniform sample of |A| concepts from the universe and B' is the rest:
//!
//! ```text
//! p = #{ replicates with d' >= d_AB } / replicates
//! ```
//!
//! Replicate `r` draws from `ChaCha8Rng::seed_from_u64(seed)` on stream `r`,
//! so a seeded test gives the same p-value for any worker count. Without a
//! seed a fresh one is drawn and returned in the result; unseeded runs vary
//! from run to run.

use crate::admixture::{AdmixtureCalculator, AdmixtureOptions};
use crate::error::{AnalysisError, AnalysisResult};
use crate::index::ClusterIndex;
use crate::models::{ConceptId, ConceptSubset, Language};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, trace, warn};

#[cfg(test)]
mod tests;

/// Replicates run when nothing else is configured
pub const DEFAULT_REPLICATES: usize = 1000;

/// Called with (completed, total) after every replicate
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Cooperative cancellation flag, checked once per replicate
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of one permutation test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermutationResult {
    pub observed_a: f64,
    pub observed_b: f64,
    /// `observed_a - observed_b`
    pub observed_diff: f64,
    /// Replicates with `d' >= observed_diff`
    pub hits: usize,
    pub replicates: usize,
    /// Exactly `hits / replicates`
    pub p_value: f64,
    /// Seed the replicates were drawn with
    pub seed: u64,
    /// Mean of the replicate differences
    pub null_mean: f64,
    pub size_a: usize,
    pub size_b: usize,
    pub universe_size: usize,
}

/// Runs permutation tests against one calculator
pub struct PermutationTester<'a> {
    calculator: &'a AdmixtureCalculator<'a>,
    /// 1 runs the replicates on the calling thread
    workers: usize,
    cancel: Option<CancelToken>,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> PermutationTester<'a> {
    pub fn new(calculator: &'a AdmixtureCalculator<'a>) -> Self {
        Self {
            calculator,
            workers: 1,
            cancel: None,
            progress_callback: None,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Language-averaged non-borrowed share over a subset.
    ///
    /// Languages without any attested concept in the subset carry no data
    /// and are left out of the average.
    pub fn score<S: AsRef<str>>(&self, concepts: &[S]) -> AnalysisResult<f64> {
        if concepts.is_empty() {
            return Err(AnalysisError::InvalidArgument(
                "cannot score an empty concept subset".to_string(),
            ));
        }
        self.mean_non_borrowed(concepts).ok_or_else(|| {
            AnalysisError::InvalidArgument(format!(
                "no language attests any of the {} concepts in the subset",
                concepts.len()
            ))
        })
    }

    /// Mean over languages with data, `None` when no language has any
    fn mean_non_borrowed<S: AsRef<str>>(&self, concepts: &[S]) -> Option<f64> {
        let values: Vec<f64> = self
            .calculator
            .languages()
            .iter()
            .filter_map(|language| self.calculator.non_borrowed_fraction(&language.id, concepts))
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Run the test. All argument checks happen before any scoring.
    pub fn run(
        &self,
        universe: &[ConceptId],
        subset_a: &[ConceptId],
        subset_b: &[ConceptId],
        replicates: usize,
        seed: Option<u64>,
    ) -> AnalysisResult<PermutationResult> {
        let universe = normalize(universe);
        let subset_a = normalize(subset_a);
        let subset_b = normalize(subset_b);

        check_arguments(&universe, &subset_a, &subset_b, replicates)?;

        let outside = subset_a
            .iter()
            .chain(subset_b.iter())
            .filter(|c| universe.binary_search(*c).is_err())
            .count();
        if outside > 0 {
            warn!("{} subset concepts are not part of the universe", outside);
        }
        let shared = subset_a
            .iter()
            .filter(|c| subset_b.binary_search(*c).is_ok())
            .count();
        if shared > 0 {
            warn!("Subsets A and B share {} concepts", shared);
        }

        let observed_a = self.score(&subset_a)?;
        let observed_b = self.score(&subset_b)?;
        let observed_diff = observed_a - observed_b;

        let seed = seed.unwrap_or_else(|| {
            let drawn = rand::random::<u64>();
            info!("No seed supplied, drew seed {}", drawn);
            drawn
        });
        info!(
            "Permutation test: {} replicates, |A|={}, |universe|={}, {} worker(s), seed {}",
            replicates,
            subset_a.len(),
            universe.len(),
            self.workers,
            seed
        );

        let completed = AtomicUsize::new(0);
        let sample_size = subset_a.len();
        let replicate = |r: usize| -> AnalysisResult<f64> {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                return Err(AnalysisError::Cancelled {
                    completed: completed.load(Ordering::SeqCst),
                });
            }
            let diff = self.replicate(&universe, sample_size, seed, r);
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(ref callback) = self.progress_callback {
                callback(done, replicates);
            }
            Ok(diff)
        };

        let diffs: Vec<f64> = if self.workers <= 1 {
            (0..replicates)
                .map(&replicate)
                .collect::<AnalysisResult<Vec<f64>>>()?
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
                .map_err(|e| AnalysisError::WorkerPool(e.to_string()))?;
            pool.install(|| {
                (0..replicates)
                    .into_par_iter()
                    .map(&replicate)
                    .collect::<AnalysisResult<Vec<f64>>>()
            })?
        };

        let hits = diffs.iter().filter(|&&d| d >= observed_diff).count();
        let null_mean = diffs.iter().sum::<f64>() / replicates as f64;
        let p_value = hits as f64 / replicates as f64;

        info!(
            "Observed difference {:.4}, p = {:.4} ({} of {} replicates)",
            observed_diff, p_value, hits, replicates
        );

        Ok(PermutationResult {
            observed_a,
            observed_b,
            observed_diff,
            hits,
            replicates,
            p_value,
            seed,
            null_mean,
            size_a: subset_a.len(),
            size_b: subset_b.len(),
            universe_size: universe.len(),
        })
    }

    /// One resampled difference: A' uniform without replacement, B' the rest.
    ///
    /// A side that no language attests scores 0, so universes holding
    /// concepts without forms never abort a running test.
    fn replicate(&self, universe: &[ConceptId], sample_size: usize, seed: u64, stream: usize) -> f64 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream as u64);

        let mut picked = vec![false; universe.len()];
        for i in rand::seq::index::sample(&mut rng, universe.len(), sample_size).iter() {
            picked[i] = true;
        }

        let mut sample_a: Vec<&str> = Vec::with_capacity(sample_size);
        let mut sample_b: Vec<&str> = Vec::with_capacity(universe.len() - sample_size);
        for (concept, &in_a) in universe.iter().zip(&picked) {
            if in_a {
                sample_a.push(concept);
            } else {
                sample_b.push(concept);
            }
        }

        let diff = self.mean_non_borrowed(&sample_a).unwrap_or(0.0)
            - self.mean_non_borrowed(&sample_b).unwrap_or(0.0);
        trace!("replicate {}: d' = {:.4}", stream, diff);
        diff
    }
}

/// Argument checks shared by every entry point; inputs are normalized
fn check_arguments(
    universe: &[ConceptId],
    subset_a: &[ConceptId],
    subset_b: &[ConceptId],
    replicates: usize,
) -> AnalysisResult<()> {
    if replicates == 0 {
        return Err(AnalysisError::InvalidArgument(
            "replicate count must be positive".to_string(),
        ));
    }
    if universe.is_empty() {
        return Err(AnalysisError::InvalidArgument(
            "concept universe is empty".to_string(),
        ));
    }
    if subset_a.is_empty() || subset_b.is_empty() {
        return Err(AnalysisError::InvalidArgument(
            "both concept subsets must be non-empty".to_string(),
        ));
    }
    if subset_a.len() > universe.len() {
        return Err(AnalysisError::InvalidArgument(format!(
            "cannot sample {} concepts from a universe of {}",
            subset_a.len(),
            universe.len()
        )));
    }
    if subset_a.len() == universe.len() {
        return Err(AnalysisError::InvalidArgument(format!(
            "sampling all {} concepts leaves an empty complement",
            universe.len()
        )));
    }
    Ok(())
}

/// Sorted, de-duplicated copy of a concept list
fn normalize(concepts: &[ConceptId]) -> Vec<ConceptId> {
    concepts
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Language-averaged proportion of non-borrowed evidence in a subset.
pub fn score_subset(
    index: &ClusterIndex,
    languages: &[Language],
    concept_subset: &[ConceptId],
) -> AnalysisResult<f64> {
    if concept_subset.is_empty() {
        return Err(AnalysisError::InvalidArgument(
            "concept subset is empty".to_string(),
        ));
    }
    let calculator = AdmixtureCalculator::new(index, languages, AdmixtureOptions::default())?;
    let subset = ConceptSubset::from_concepts("subset", concept_subset.iter().cloned());
    PermutationTester::new(&calculator).score(&subset.concepts)
}

/// Single-threaded permutation test of `subset_a` against `subset_b`.
pub fn permutation_test(
    index: &ClusterIndex,
    languages: &[Language],
    universe: &[ConceptId],
    subset_a: &[ConceptId],
    subset_b: &[ConceptId],
    replicates: usize,
    seed: Option<u64>,
) -> AnalysisResult<PermutationResult> {
    check_arguments(
        &normalize(universe),
        &normalize(subset_a),
        &normalize(subset_b),
        replicates,
    )?;
    let calculator = AdmixtureCalculator::new(index, languages, AdmixtureOptions::default())?;
    PermutationTester::new(&calculator).run(universe, subset_a, subset_b, replicates, seed)
}
