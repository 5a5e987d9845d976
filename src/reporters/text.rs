//! Text (terminal) reporter with colors and aligned columns

use super::{SignificanceReport, SubsetScore};
use crate::admixture::{AdmixtureTable, FAMILY_SEPARATOR};
use anyhow::Result;

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";

const RULE: &str = "──────────────────────────────────────";

fn percent(share: f64) -> String {
    format!("{:.1}%", share * 100.0)
}

/// p-value color: green below 0.05, yellow below 0.1
fn p_color(p: f64) -> &'static str {
    if p < 0.05 {
        GREEN
    } else if p < 0.1 {
        YELLOW
    } else {
        RED
    }
}

/// Render an admixture table as aligned terminal columns
pub fn render_admixture(table: &AdmixtureTable) -> Result<String> {
    let mut out = String::new();

    out.push_str(&format!("\n{BOLD}Admixture: {}{RESET}\n", table.subset));
    out.push_str(&format!("{DIM}{RULE}{RESET}\n"));
    out.push_str(&format!(
        "Concepts: {}  Languages: {}\n\n",
        table.concept_count,
        table.records.len()
    ));

    if table.records.is_empty() {
        out.push_str("No languages to report.\n");
        return Ok(out);
    }

    let lang_width = table
        .records
        .iter()
        .map(|r| r.language_id.len())
        .chain(std::iter::once("Language".len()))
        .max()
        .unwrap_or(8);
    let family_width = table
        .records
        .iter()
        .map(|r| r.family.len())
        .chain(std::iter::once("Family".len()))
        .max()
        .unwrap_or(6);
    let widths: Vec<usize> = table.categories.iter().map(|c| c.len().max(6)).collect();

    let mut header = format!("{:<lang_width$}  {:<family_width$}", "Language", "Family");
    for (label, width) in table.categories.iter().zip(&widths) {
        header.push_str(&format!("  {:>width$}", label));
    }
    header.push_str("  Inherited");
    out.push_str(&format!("{BOLD}{header}{RESET}\n"));

    for record in &table.records {
        let mut line = format!(
            "{:<lang_width$}  {:<family_width$}",
            record.language_id, record.family
        );
        for (label, width) in table.categories.iter().zip(&widths) {
            let cell = format!("{:>width$}", percent(record.share(label)));
            if label.contains(FAMILY_SEPARATOR) && record.share(label) > 0.0 {
                line.push_str(&format!("  {YELLOW}{cell}{RESET}"));
            } else {
                line.push_str(&format!("  {cell}"));
            }
        }
        match record.non_borrowed_share() {
            Some(share) => line.push_str(&format!("  {:>9}", percent(share))),
            None => line.push_str(&format!("  {DIM}{:>9}{RESET}", "n/a")),
        }
        out.push_str(&line);
        out.push('\n');
    }

    if let Some(mean) = table.mean_non_borrowed() {
        out.push_str(&format!(
            "\n{DIM}Mean non-borrowed share:{RESET} {BOLD}{}{RESET}\n",
            percent(mean)
        ));
    }

    Ok(out)
}

/// Render subset scores, one line per concept list
pub fn render_scores(scores: &[SubsetScore]) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!("\n{BOLD}Non-borrowed proportion{RESET}\n"));
    out.push_str(&format!("{DIM}{RULE}{RESET}\n"));

    let width = scores.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for score in scores {
        out.push_str(&format!(
            "{:<width$}  {BOLD}{:.4}{RESET}  {DIM}({} items){RESET}\n",
            score.name, score.score, score.concepts
        ));
    }
    Ok(out)
}

/// Render a significance report
pub fn render_significance(report: &SignificanceReport) -> Result<String> {
    let r = &report.result;
    let mut out = String::new();

    out.push_str(&format!(
        "\n{BOLD}Permutation test: {} vs {}{RESET}\n",
        report.subset_a, report.subset_b
    ));
    out.push_str(&format!("{DIM}{RULE}{RESET}\n"));
    out.push_str(&format!(
        "Score A: {:.4}  ({} items)\n",
        r.observed_a, r.size_a
    ));
    out.push_str(&format!(
        "Score B: {:.4}  ({} items)\n",
        r.observed_b, r.size_b
    ));
    out.push_str(&format!("Observed difference: {BOLD}{:+.4}{RESET}\n", r.observed_diff));
    out.push_str(&format!("Null mean difference: {:+.4}\n", r.null_mean));
    out.push_str(&format!(
        "p = {}{BOLD}{:.4}{RESET}  ({} of {} replicates, universe of {})\n",
        p_color(r.p_value),
        r.p_value,
        r.hits,
        r.replicates,
        r.universe_size
    ));
    out.push_str(&format!("{DIM}Seed: {}{RESET}\n", r.seed));
    Ok(out)
}
