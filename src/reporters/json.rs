//! JSON reporter
//!
//! Outputs results as pretty-printed JSON with a `generated_at` timestamp.
//! Useful for machine consumption, piping to jq, or further processing.

use super::{SignificanceReport, SubsetScore};
use crate::admixture::AdmixtureTable;
use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    generated_at: String,
    version: &'static str,
    #[serde(flatten)]
    body: &'a T,
}

#[derive(Serialize)]
struct Scores<'a> {
    scores: &'a [SubsetScore],
}

fn wrap<T: Serialize>(body: &T) -> Result<String> {
    let envelope = Envelope {
        generated_at: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        body,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

pub fn render_admixture(table: &AdmixtureTable) -> Result<String> {
    wrap(table)
}

pub fn render_scores(scores: &[SubsetScore]) -> Result<String> {
    wrap(&Scores { scores })
}

pub fn render_significance(report: &SignificanceReport) -> Result<String> {
    wrap(report)
}
