//! Output reporters for seabor results
//!
//! Supports multiple output formats:
//! - `text` - Terminal table with colors
//! - `json` - Machine-readable JSON
//! - `markdown` - GitHub-flavored Markdown

mod json;
mod markdown;
mod text;

use crate::admixture::AdmixtureTable;
use crate::significance::PermutationResult;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Non-borrowed proportion of one named concept list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsetScore {
    pub name: String,
    pub concepts: usize,
    pub score: f64,
}

/// A permutation result with the names of the compared subsets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificanceReport {
    pub subset_a: String,
    pub subset_b: String,
    #[serde(flatten)]
    pub result: PermutationResult,
}

/// Render an admixture table in the specified format
pub fn render_admixture(table: &AdmixtureTable, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render_admixture(table),
        OutputFormat::Json => json::render_admixture(table),
        OutputFormat::Markdown => markdown::render_admixture(table),
    }
}

/// Render subset scores in the specified format
pub fn render_scores(scores: &[SubsetScore], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render_scores(scores),
        OutputFormat::Json => json::render_scores(scores),
        OutputFormat::Markdown => markdown::render_scores(scores),
    }
}

/// Render a significance report in the specified format
pub fn render_significance(report: &SignificanceReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render_significance(report),
        OutputFormat::Json => json::render_significance(report),
        OutputFormat::Markdown => markdown::render_significance(report),
    }
}

/// Get the recommended file extension for a format
pub fn file_extension(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::admixture::ProportionRecord;
    use std::collections::BTreeMap;

    /// Two languages, one of them borrowing a quarter of its items
    pub(crate) fn test_table() -> AdmixtureTable {
        let record = |id: &str, family: &str, shares: &[(&str, f64)], missing: usize| {
            ProportionRecord {
                language_id: id.into(),
                family: family.into(),
                subgroup: None,
                scored: 4 - missing,
                missing,
                shares: shares
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect::<BTreeMap<_, _>>(),
            }
        };
        AdmixtureTable {
            subset: "basic".into(),
            concept_count: 4,
            categories: vec![
                "missing".into(),
                "singleton".into(),
                "X".into(),
                "X--Y".into(),
            ],
            records: vec![
                record("L1", "X", &[("X", 0.5), ("X--Y", 0.25), ("singleton", 0.25)], 0),
                record("L2", "X", &[("X", 0.75), ("missing", 0.25)], 1),
            ],
        }
    }

    pub(crate) fn test_significance() -> SignificanceReport {
        SignificanceReport {
            subset_a: "basic".into(),
            subset_b: "!= basic".into(),
            result: PermutationResult {
                observed_a: 0.9,
                observed_b: 0.6,
                observed_diff: 0.30000000000000004,
                hits: 12,
                replicates: 1000,
                p_value: 0.012,
                seed: 42,
                null_mean: 0.01,
                size_a: 40,
                size_b: 160,
                universe_size: 200,
            },
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_str("md").unwrap(),
            OutputFormat::Markdown
        );
        assert!(OutputFormat::from_str("sarif").is_err());
    }

    #[test]
    fn test_format_display_round_trip() {
        for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Markdown] {
            assert_eq!(OutputFormat::from_str(&format.to_string()).unwrap(), format);
        }
        assert_eq!(file_extension(OutputFormat::Markdown), "md");
    }
}
