//! Markdown reporter for GitHub-flavored Markdown output

use super::{SignificanceReport, SubsetScore};
use crate::admixture::AdmixtureTable;
use anyhow::Result;
use chrono::Local;

fn percent(share: f64) -> String {
    format!("{:.1}%", share * 100.0)
}

fn render_footer() -> String {
    format!(
        "---\n\n*Generated by seabor {} on {}*\n",
        env!("CARGO_PKG_VERSION"),
        Local::now().format("%Y-%m-%d %H:%M")
    )
}

/// Render an admixture table as a GitHub table
pub fn render_admixture(table: &AdmixtureTable) -> Result<String> {
    let mut md = String::new();

    md.push_str(&format!("# Admixture: {}\n\n", table.subset));
    md.push_str(&format!(
        "**Concepts:** {} | **Languages:** {}\n\n",
        table.concept_count,
        table.records.len()
    ));

    md.push_str("| Language | Family |");
    for label in &table.categories {
        md.push_str(&format!(" {} |", label));
    }
    md.push_str(" Inherited |\n|---|---|");
    for _ in &table.categories {
        md.push_str("---:|");
    }
    md.push_str("---:|\n");

    for record in &table.records {
        md.push_str(&format!("| {} | {} |", record.language_id, record.family));
        for label in &table.categories {
            md.push_str(&format!(" {} |", percent(record.share(label))));
        }
        let inherited = record
            .non_borrowed_share()
            .map(percent)
            .unwrap_or_else(|| "n/a".to_string());
        md.push_str(&format!(" {} |\n", inherited));
    }

    if let Some(mean) = table.mean_non_borrowed() {
        md.push_str(&format!(
            "\n**Mean non-borrowed share:** {}\n",
            percent(mean)
        ));
    }

    md.push('\n');
    md.push_str(&render_footer());
    Ok(md)
}

pub fn render_scores(scores: &[SubsetScore]) -> Result<String> {
    let mut md = String::from("# Non-borrowed proportion\n\n| Concept list | Items | Score |\n|---|---:|---:|\n");
    for score in scores {
        md.push_str(&format!(
            "| {} | {} | {:.4} |\n",
            score.name, score.concepts, score.score
        ));
    }
    md.push('\n');
    md.push_str(&render_footer());
    Ok(md)
}

pub fn render_significance(report: &SignificanceReport) -> Result<String> {
    let r = &report.result;
    let mut md = String::new();

    md.push_str(&format!(
        "# Permutation test: {} vs {}\n\n",
        report.subset_a, report.subset_b
    ));
    md.push_str("| Metric | Value |\n|---|---:|\n");
    md.push_str(&format!("| Score A ({} items) | {:.4} |\n", r.size_a, r.observed_a));
    md.push_str(&format!("| Score B ({} items) | {:.4} |\n", r.size_b, r.observed_b));
    md.push_str(&format!("| Observed difference | {:+.4} |\n", r.observed_diff));
    md.push_str(&format!("| Null mean difference | {:+.4} |\n", r.null_mean));
    md.push_str(&format!("| **p-value** | **{:.4}** |\n", r.p_value));
    md.push_str(&format!("| Hits / replicates | {} / {} |\n", r.hits, r.replicates));
    md.push_str(&format!("| Universe | {} |\n", r.universe_size));
    md.push_str(&format!("| Seed | {} |\n", r.seed));

    md.push('\n');
    md.push_str(&render_footer());
    Ok(md)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::{test_significance, test_table};

    #[test]
    fn test_markdown_admixture_table() {
        let md = render_admixture(&test_table()).expect("render markdown");
        assert!(md.starts_with("# Admixture: basic"));
        assert!(md.contains("| Language | Family | missing | singleton | X | X--Y | Inherited |"));
        assert!(md.contains("| L1 | X | 0.0% | 25.0% | 50.0% | 25.0% | 75.0% |"));
        assert!(md.contains("| L2 | X | 25.0% | 0.0% | 75.0% | 0.0% | 100.0% |"));
    }

    #[test]
    fn test_markdown_significance() {
        let md = render_significance(&test_significance()).expect("render markdown");
        assert!(md.contains("| **p-value** | **0.0120** |"));
        assert!(md.contains("| Hits / replicates | 12 / 1000 |"));
    }

    #[test]
    fn test_markdown_scores() {
        let scores = vec![SubsetScore { name: "basic".into(), concepts: 40, score: 0.5 }];
        let md = render_scores(&scores).expect("render markdown");
        assert!(md.contains("| basic | 40 | 0.5000 |"));
    }
}
