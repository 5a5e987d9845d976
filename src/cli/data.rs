//! Input resolution shared by the analysis commands

use super::{DataArgs, OutputArgs};
use anyhow::{bail, Context, Result};
use console::style;
use seabor::admixture::{AdmixtureOptions, CrossFamilyLabel};
use seabor::config::ProjectConfig;
use seabor::dataset::{languages_from_forms, load_forms, load_languages};
use seabor::index::{build_cluster_index, ClusterIndex};
use seabor::models::Language;
use seabor::reporters::OutputFormat;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Everything an analysis command needs from disk
pub(crate) struct Dataset {
    pub index: ClusterIndex,
    pub languages: Vec<Language>,
    pub options: AdmixtureOptions,
}

/// Resolve inputs from flags first, then from the project config
pub(crate) fn load(config: &ProjectConfig, args: &DataArgs) -> Result<Dataset> {
    let Some(forms_path) = args.forms.clone().or_else(|| config.forms_path()) else {
        bail!("No forms table given. Pass --forms or set [data] forms in seabor.toml");
    };
    let forms = load_forms(&forms_path)?;
    if forms.is_empty() {
        bail!("{} contains no forms", forms_path.display());
    }

    let languages = match args.languages.clone().or_else(|| config.languages_path()) {
        Some(path) => load_languages(&path)?,
        None => languages_from_forms(&forms),
    };

    let mut options = config.admixture_options();
    if let Some(ref mode) = args.cross_family_label {
        options.cross_family_label = CrossFamilyLabel::from_str(mode)?;
    }

    let index = build_cluster_index(forms);
    info!(
        "Loaded {} forms, {} languages, {} concepts from {}",
        index.len(),
        languages.len(),
        index.concepts().count(),
        forms_path.display()
    );

    Ok(Dataset {
        index,
        languages,
        options,
    })
}

/// Output format from the flag, then `[defaults] format`, then text
pub(crate) fn output_format(config: &ProjectConfig, args: &OutputArgs) -> Result<OutputFormat> {
    match args.format.as_deref().or(config.defaults.format.as_deref()) {
        Some(format) => OutputFormat::from_str(format),
        None => Ok(OutputFormat::Text),
    }
}

/// Write a rendered report to the output file or stdout.
///
/// Terminal styling survives only on a stdout that takes colors.
pub(crate) fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, console::strip_ansi_codes(rendered).as_bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            // Use stderr to keep stdout clean
            eprintln!(
                "Report written to: {}",
                style(path.display()).cyan()
            );
        }
        None if console::colors_enabled() => print!("{}", rendered),
        None => print!("{}", console::strip_ansi_codes(rendered)),
    }
    Ok(())
}
