//! Admixture command - per-language category shares

use super::data::{emit, load, output_format};
use super::{DataArgs, OutputArgs};
use anyhow::Result;
use seabor::admixture::AdmixtureCalculator;
use seabor::config::ProjectConfig;
use seabor::dataset::load_concept_list;
use seabor::models::{ConceptId, ConceptSubset};
use seabor::reporters::render_admixture;
use std::path::Path;

pub fn run(
    config: &ProjectConfig,
    data: &DataArgs,
    concepts: Option<&Path>,
    complement: bool,
    output: &OutputArgs,
) -> Result<()> {
    let format = output_format(config, output)?;
    let dataset = load(config, data)?;
    let universe: Vec<ConceptId> = dataset.index.concepts().map(str::to_string).collect();

    let subset = match concepts {
        Some(path) => {
            let list = load_concept_list(path)?;
            if complement {
                list.complement(&universe)
            } else {
                list
            }
        }
        None => ConceptSubset::all(universe),
    };

    let calculator = AdmixtureCalculator::new(&dataset.index, &dataset.languages, dataset.options)?;
    let table = calculator.compute(&subset)?;

    emit(&render_admixture(&table, format)?, output.output.as_deref())
}
