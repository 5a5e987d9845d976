//! Score command - non-borrowed proportion of concept lists

use super::data::{emit, load, output_format};
use super::{DataArgs, OutputArgs};
use anyhow::Result;
use seabor::admixture::AdmixtureCalculator;
use seabor::config::ProjectConfig;
use seabor::dataset::load_concept_list;
use seabor::models::ConceptSubset;
use seabor::reporters::{render_scores, SubsetScore};
use seabor::significance::PermutationTester;
use std::path::PathBuf;

pub fn run(
    config: &ProjectConfig,
    data: &DataArgs,
    concepts: &[PathBuf],
    output: &OutputArgs,
) -> Result<()> {
    let format = output_format(config, output)?;
    let dataset = load(config, data)?;

    let mut subsets = vec![ConceptSubset::all(dataset.index.concepts())];
    for path in concepts {
        subsets.push(load_concept_list(path)?);
    }

    let calculator = AdmixtureCalculator::new(&dataset.index, &dataset.languages, dataset.options)?;
    let tester = PermutationTester::new(&calculator);

    let mut scores = Vec::with_capacity(subsets.len());
    for subset in &subsets {
        scores.push(SubsetScore {
            name: subset.name.clone(),
            concepts: subset.len(),
            score: tester.score(&subset.concepts)?,
        });
    }

    emit(&render_scores(&scores, format)?, output.output.as_deref())
}
