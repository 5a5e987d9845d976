//! Significance command - permutation test between two concept lists

use super::data::{emit, load, output_format};
use super::{DataArgs, OutputArgs};
use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use seabor::admixture::AdmixtureCalculator;
use seabor::config::ProjectConfig;
use seabor::dataset::load_concept_list;
use seabor::models::{ConceptId, ConceptSubset};
use seabor::reporters::{render_significance, SignificanceReport};
use seabor::significance::PermutationTester;
use std::path::Path;

/// Test-specific flags
pub struct TestArgs<'a> {
    pub concepts: &'a Path,
    pub versus: Option<&'a Path>,
    pub universe: Option<&'a Path>,
    pub runs: Option<usize>,
    pub seed: Option<u64>,
    pub workers: Option<usize>,
    pub progress: bool,
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░  ")
}

pub fn run(
    config: &ProjectConfig,
    data: &DataArgs,
    args: TestArgs<'_>,
    output: &OutputArgs,
) -> Result<()> {
    let format = output_format(config, output)?;
    let dataset = load(config, data)?;

    let universe: Vec<ConceptId> = match args.universe {
        Some(path) => load_concept_list(path)?.concepts,
        None => dataset.index.concepts().map(str::to_string).collect(),
    };
    let subset_a = load_concept_list(args.concepts)?;
    let subset_b = match args.versus {
        Some(path) => load_concept_list(path)?,
        None => subset_a.complement(&universe),
    };
    let subset_a = restrict(subset_a, &universe);

    let runs = args.runs.unwrap_or(config.significance.runs);
    let seed = args.seed.or(config.significance.seed);
    let workers = args.workers.or(config.significance.workers).unwrap_or(1);

    let calculator = AdmixtureCalculator::new(&dataset.index, &dataset.languages, dataset.options)?;
    let mut tester = PermutationTester::new(&calculator).with_workers(workers);

    let bar = if args.progress {
        ProgressBar::new(runs as u64)
    } else {
        ProgressBar::hidden()
    };
    bar.set_style(bar_style());
    bar.set_message("Resampling...");
    let ticker = bar.clone();
    tester = tester.with_progress_callback(Box::new(move |done, _| {
        ticker.set_position(done as u64);
    }));

    let result = tester.run(
        &universe,
        &subset_a.concepts,
        &subset_b.concepts,
        runs,
        seed,
    );
    bar.finish_and_clear();
    let result = result?;

    if args.progress {
        eprintln!(
            "{}Permutation test done ({} replicates, seed {})",
            style("✓ ").green(),
            style(result.replicates).cyan(),
            style(result.seed).cyan(),
        );
    }

    let report = SignificanceReport {
        subset_a: subset_a.name,
        subset_b: subset_b.name,
        result,
    };
    emit(&render_significance(&report, format)?, output.output.as_deref())
}

/// Sampling draws |A| concepts from the universe, so A is counted only
/// within it. `universe` must be sorted.
fn restrict(subset: ConceptSubset, universe: &[ConceptId]) -> ConceptSubset {
    let inside: Vec<ConceptId> = subset
        .concepts
        .iter()
        .filter(|c| universe.binary_search(*c).is_ok())
        .cloned()
        .collect();
    if inside.len() == subset.len() {
        return subset;
    }
    tracing::warn!(
        "{} concepts of '{}' are outside the universe and are ignored",
        subset.len() - inside.len(),
        subset.name
    );
    ConceptSubset::from_concepts(subset.name, inside)
}
