//! CLI flag contract tests
//!
//! Runs the built binary against the fixture wordlist and checks that
//! --format, --output, --seed, --workers, --complement and config loading
//! behave as documented.

use std::path::{Path, PathBuf};
use std::process::Command;

fn seabor_bin() -> String {
    env!("CARGO_BIN_EXE_seabor").to_string()
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Run seabor in `dir` with the fixture wordlist, returning (exit code, stdout, stderr)
fn run_seabor(dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(seabor_bin())
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run seabor");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output.status.code().unwrap_or(-1), stdout, stderr)
}

fn with_data<'a>(args: &[&'a str], forms: &'a str, languages: &'a str) -> Vec<&'a str> {
    let mut full = args.to_vec();
    full.extend(["--forms", forms, "--languages", languages]);
    full
}

fn parse_json(json_str: &str) -> serde_json::Value {
    serde_json::from_str(json_str).expect("Invalid JSON")
}

// ============================================================================
// admixture
// ============================================================================

#[test]
fn test_admixture_json() {
    let dir = tempfile::tempdir().unwrap();
    let forms = fixture("forms.tsv");
    let languages = fixture("languages.csv");
    let args = with_data(
        &["admixture", "--format", "json"],
        forms.to_str().unwrap(),
        languages.to_str().unwrap(),
    );
    let (code, stdout, _) = run_seabor(dir.path(), &args);
    assert_eq!(code, 0);

    let json = parse_json(&stdout);
    assert_eq!(json["subset"], "All items");
    assert_eq!(json["concept_count"], 7);
    assert_eq!(json["records"].as_array().unwrap().len(), 4);
    assert!(json["generated_at"].is_string());
}

#[test]
fn test_admixture_complement_of_concept_list() {
    let dir = tempfile::tempdir().unwrap();
    let forms = fixture("forms.tsv");
    let languages = fixture("languages.csv");
    let basic = fixture("basic.txt");
    let args = with_data(
        &[
            "admixture",
            "--concepts",
            basic.to_str().unwrap(),
            "--complement",
            "--format",
            "json",
        ],
        forms.to_str().unwrap(),
        languages.to_str().unwrap(),
    );
    let (code, stdout, _) = run_seabor(dir.path(), &args);
    assert_eq!(code, 0);

    let json = parse_json(&stdout);
    assert_eq!(json["subset"], "!= basic");
    assert_eq!(json["concept_count"], 3);
}

#[test]
fn test_admixture_markdown_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let forms = fixture("forms.tsv");
    let languages = fixture("languages.csv");
    let out = dir.path().join("report.md");
    let args = with_data(
        &["admixture", "--format", "md", "--output", out.to_str().unwrap()],
        forms.to_str().unwrap(),
        languages.to_str().unwrap(),
    );
    let (code, stdout, stderr) = run_seabor(dir.path(), &args);
    assert_eq!(code, 0);
    assert!(stdout.is_empty(), "stdout should stay empty: {stdout}");
    assert!(stderr.contains("Report written to"));

    let md = std::fs::read_to_string(&out).unwrap();
    assert!(md.contains("| Language | Family |"));
    assert!(md.contains("Austronesian--Tai-Kadai"));
}

#[test]
fn test_admixture_text_output_is_plain() {
    let dir = tempfile::tempdir().unwrap();
    let forms = fixture("forms.tsv");
    let languages = fixture("languages.csv");
    let out = dir.path().join("report.txt");
    let args = with_data(
        &["admixture", "--output", out.to_str().unwrap()],
        forms.to_str().unwrap(),
        languages.to_str().unwrap(),
    );
    let (code, _, _) = run_seabor(dir.path(), &args);
    assert_eq!(code, 0);
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("Admixture: All items"));
    assert!(!text.contains('\x1b'), "file output carries escapes: {text:?}");

    // stdout is a pipe here, so it stays plain too
    let args = with_data(&["admixture"], forms.to_str().unwrap(), languages.to_str().unwrap());
    let (code, stdout, _) = run_seabor(dir.path(), &args);
    assert_eq!(code, 0);
    assert!(stdout.contains("Mean non-borrowed share:"));
    assert!(!stdout.contains('\x1b'));
}

#[test]
fn test_missing_forms_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_seabor(dir.path(), &["admixture"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("No forms table given"));
}

// ============================================================================
// score
// ============================================================================

#[test]
fn test_score_lists() {
    let dir = tempfile::tempdir().unwrap();
    let forms = fixture("forms.tsv");
    let languages = fixture("languages.csv");
    let basic = fixture("basic.txt");
    let cultural = fixture("cultural.txt");
    let args = with_data(
        &[
            "score",
            "--concepts",
            basic.to_str().unwrap(),
            "--concepts",
            cultural.to_str().unwrap(),
            "--format",
            "json",
        ],
        forms.to_str().unwrap(),
        languages.to_str().unwrap(),
    );
    let (code, stdout, _) = run_seabor(dir.path(), &args);
    assert_eq!(code, 0);

    let json = parse_json(&stdout);
    let scores = json["scores"].as_array().unwrap();
    assert_eq!(scores.len(), 3);
    assert_eq!(scores[0]["name"], "All items");
    assert_eq!(scores[1]["name"], "basic");
    assert_eq!(scores[1]["score"], 1.0);
    assert_eq!(scores[2]["concepts"], 3);
}

// ============================================================================
// significance
// ============================================================================

fn run_significance(dir: &Path, extra: &[&str]) -> (i32, String, String) {
    let forms = fixture("forms.tsv");
    let languages = fixture("languages.csv");
    let basic = fixture("basic.txt");
    let mut args = vec![
        "significance",
        "--concepts",
        basic.to_str().unwrap(),
        "--no-progress",
        "--format",
        "json",
    ];
    args.extend_from_slice(extra);
    let args = with_data(&args, forms.to_str().unwrap(), languages.to_str().unwrap());
    run_seabor(dir, &args)
}

#[test]
fn test_significance_seeded_is_reproducible_across_workers() {
    let dir = tempfile::tempdir().unwrap();
    let (code, first, _) = run_significance(dir.path(), &["--runs", "300", "--seed", "5"]);
    assert_eq!(code, 0);
    let (code, second, _) = run_significance(
        dir.path(),
        &["--runs", "300", "--seed", "5", "--workers", "4"],
    );
    assert_eq!(code, 0);

    let a = parse_json(&first);
    let b = parse_json(&second);
    assert_eq!(a["subset_a"], "basic");
    assert_eq!(a["subset_b"], "!= basic");
    assert_eq!(a["seed"], 5);
    assert_eq!(a["replicates"], 300);
    assert_eq!(a["hits"], b["hits"]);
    assert_eq!(a["p_value"], b["p_value"]);
}

#[test]
fn test_significance_reports_drawn_seed() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_significance(dir.path(), &["--runs", "50"]);
    assert_eq!(code, 0);
    let json = parse_json(&stdout);
    assert!(json["seed"].is_u64());
    let p = json["p_value"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&p));
}

#[test]
fn test_significance_uses_config_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("seabor.toml"),
        format!(
            "[data]\nforms = {:?}\nlanguages = {:?}\n\n[significance]\nruns = 40\nseed = 3\n",
            fixture("forms.tsv").to_str().unwrap(),
            fixture("languages.csv").to_str().unwrap(),
        ),
    )
    .unwrap();
    let basic = fixture("basic.txt");
    let (code, stdout, _) = run_seabor(
        dir.path(),
        &[
            "significance",
            "--concepts",
            basic.to_str().unwrap(),
            "--no-progress",
            "--format",
            "json",
        ],
    );
    assert_eq!(code, 0);
    let json = parse_json(&stdout);
    assert_eq!(json["replicates"], 40);
    assert_eq!(json["seed"], 3);
}

#[test]
fn test_significance_rejects_zero_runs() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_significance(dir.path(), &["--runs", "0"]);
    assert_ne!(code, 0);
}

// ============================================================================
// init / version
// ============================================================================

#[test]
fn test_init_writes_config_once() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_seabor(dir.path(), &["init"]);
    assert_eq!(code, 0);
    let content = std::fs::read_to_string(dir.path().join("seabor.toml")).unwrap();
    assert!(content.contains("[significance]"));

    let (code, _, stderr) = run_seabor(dir.path(), &["init"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("already exists"));

    let (code, _, _) = run_seabor(dir.path(), &["init", "--force"]);
    assert_eq!(code, 0);
}

#[test]
fn test_version() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_seabor(dir.path(), &["version"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("seabor "));
}
