//! Dataset ingestion
//!
//! Reads the delimited tables produced by cognate and borrowing detection
//! pipelines. Column names are matched case-insensitively against a small
//! alias list so that both CLDF-style exports (`Language_ID`,
//! `Parameter_ID`, `Cognateset_ID`, `Borrowing_ID`) and LingPy-style
//! wordlists (`DOCULECT`, `CONCEPT`, `AUTOCOGID`, `AUTOBORID`) load without
//! conversion.

use crate::models::{ConceptSubset, Form, Language};
use anyhow::{bail, Context, Result};
use csv::StringRecord;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};


const ID: &[&str] = &["id"];
const LANGUAGE: &[&str] = &["language_id", "doculect", "language"];
const FAMILY: &[&str] = &["family"];
const CONCEPT: &[&str] = &["parameter_id", "concept", "concept_id"];
const COGNATE: &[&str] = &["cognateset_id", "autocogid", "cogid"];
const BORROWING: &[&str] = &["borrowing_id", "xenolog_cluster_id", "autoborid", "borid"];

const NAME: &[&str] = &["name"];
const SUBGROUP: &[&str] = &["subgroup", "sub_group"];
const LATITUDE: &[&str] = &["latitude", "lat"];
const LONGITUDE: &[&str] = &["longitude", "lon", "long"];

/// Column positions resolved from a header row
struct Columns {
    lookup: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let lookup = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();
        Self { lookup }
    }

    fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|a| self.lookup.get(*a).copied())
    }

    fn require(&self, aliases: &[&str], path: &Path) -> Result<usize> {
        match self.find(aliases) {
            Some(i) => Ok(i),
            None => bail!(
                "{}: missing required column (expected one of: {})",
                path.display(),
                aliases.join(", ")
            ),
        }
    }
}

fn field(record: &StringRecord, column: Option<usize>) -> Option<&str> {
    column
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Cluster ids of `0` mark unassigned forms in older exports
fn cluster_id(record: &StringRecord, column: Option<usize>) -> Option<String> {
    field(record, column)
        .filter(|v| *v != "0")
        .map(str::to_string)
}

fn reader_for(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("tab") => b'\t',
        _ => b',',
    };
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .comment(Some(b'#'))
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))
}

/// Load forms from a CSV or TSV file.
///
/// A missing `ID` column falls back to the 1-based row number. A missing
/// `Family` column leaves the family empty; families then come from the
/// language table.
pub fn load_forms(path: &Path) -> Result<Vec<Form>> {
    let mut reader = reader_for(path)?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();
    let columns = Columns::new(&headers);

    let id = columns.find(ID);
    let language = columns.require(LANGUAGE, path)?;
    let concept = columns.require(CONCEPT, path)?;
    let family = columns.find(FAMILY);
    let cognate = columns.find(COGNATE);
    let borrowing = columns.find(BORROWING);

    if cognate.is_none() {
        warn!("{} has no cognate column; every form is a singleton", path.display());
    }
    if borrowing.is_none() {
        warn!("{} has no borrowing column; nothing is cross-family", path.display());
    }

    let mut forms = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("{}: malformed row {}", path.display(), row + 2))?;
        let Some(language_id) = field(&record, Some(language)) else {
            bail!("{}: row {} has no language", path.display(), row + 2);
        };
        let Some(concept_id) = field(&record, Some(concept)) else {
            bail!("{}: row {} has no concept", path.display(), row + 2);
        };
        let form_id = field(&record, id)
            .map(str::to_string)
            .unwrap_or_else(|| (row + 1).to_string());

        forms.push(Form {
            id: form_id,
            language_id: language_id.to_string(),
            family: field(&record, family).unwrap_or_default().to_string(),
            concept_id: concept_id.to_string(),
            cognate_id: cluster_id(&record, cognate),
            borrowing_id: cluster_id(&record, borrowing),
        });
    }

    debug!("Loaded {} forms from {}", forms.len(), path.display());
    Ok(forms)
}

/// Load the language table (`ID, Name, Family, SubGroup, Latitude, Longitude`)
pub fn load_languages(path: &Path) -> Result<Vec<Language>> {
    let mut reader = reader_for(path)?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();
    let columns = Columns::new(&headers);

    let id = columns.require(ID, path)?;
    let family = columns.require(FAMILY, path)?;
    let name = columns.find(NAME);
    let subgroup = columns.find(SUBGROUP);
    let latitude = columns.find(LATITUDE);
    let longitude = columns.find(LONGITUDE);

    let mut languages = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("{}: malformed row {}", path.display(), row + 2))?;
        let Some(language_id) = field(&record, Some(id)) else {
            bail!("{}: row {} has no language id", path.display(), row + 2);
        };
        languages.push(Language {
            id: language_id.to_string(),
            name: field(&record, name).map(str::to_string),
            family: field(&record, Some(family)).unwrap_or_default().to_string(),
            subgroup: field(&record, subgroup).map(str::to_string),
            latitude: coordinate(&record, latitude),
            longitude: coordinate(&record, longitude),
        });
    }

    debug!("Loaded {} languages from {}", languages.len(), path.display());
    Ok(languages)
}

fn coordinate(record: &StringRecord, column: Option<usize>) -> Option<f64> {
    let raw = field(record, column)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring unparseable coordinate '{}'", raw);
            None
        }
    }
}

/// Derive the language set from the forms themselves.
///
/// The first family seen for a language wins; later disagreements are
/// logged. Output is sorted by family, then id.
pub fn languages_from_forms(forms: &[Form]) -> Vec<Language> {
    let mut families: HashMap<&str, &str> = HashMap::new();
    for form in forms {
        match families.get(form.language_id.as_str()) {
            None => {
                families.insert(&form.language_id, &form.family);
            }
            Some(&family) if family != form.family => {
                warn!(
                    "Form '{}' gives {} family '{}', keeping '{}'",
                    form.id, form.language_id, form.family, family
                );
            }
            Some(_) => {}
        }
    }

    let mut languages: Vec<Language> = families
        .into_iter()
        .map(|(id, family)| Language::new(id, family))
        .collect();
    languages.sort_by(|a, b| a.family.cmp(&b.family).then_with(|| a.id.cmp(&b.id)));
    languages
}

/// Load a concept list: one id per line, `#` starts a comment.
///
/// The subset is named after the file stem.
pub fn load_concept_list(path: &Path) -> Result<ConceptSubset> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read concept list {}", path.display()))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("concepts")
        .to_string();

    let concepts = content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty());
    let subset = ConceptSubset::from_concepts(name, concepts);
    if subset.is_empty() {
        warn!("Concept list {} is empty", path.display());
    }
    debug!("Loaded {} concepts from {}", subset.len(), path.display());
    Ok(subset)
}
