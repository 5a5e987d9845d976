//! Project-level configuration support
//!
//! Loads per-project configuration from `seabor.toml`, by default in the
//! working directory.
//!
//! # Configuration Format
//!
//! ```toml
//! # seabor.toml
//!
//! [data]
//! forms = "data/forms.csv"
//! languages = "data/languages.csv"
//!
//! [analysis]
//! cross_family_label = "all-members"  # or "exclude-own"
//!
//! [significance]
//! runs = 1000
//! seed = 42
//! workers = 4
//!
//! [defaults]
//! format = "text"
//! ```
//!
//! Relative data paths are resolved against the directory holding the
//! config file.

use crate::admixture::{AdmixtureOptions, CrossFamilyLabel};
use crate::significance::DEFAULT_REPLICATES;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};


/// File name looked up when no `--config` is given
pub const CONFIG_FILE_NAME: &str = "seabor.toml";

/// Written by `seabor init`
pub const EXAMPLE_CONFIG: &str = r#"# seabor.toml

[data]
# Forms table (CSV or TSV). Needs language and concept columns; cognate
# and borrowing cluster columns are picked up when present.
forms = "forms.csv"
# Optional language table (ID, Name, Family, SubGroup, Latitude, Longitude).
# Without it, languages and families are taken from the forms table.
# languages = "languages.csv"

[analysis]
# "all-members" labels a cross-family borrowing with every family in the
# cluster; "exclude-own" leaves out the language's own family.
cross_family_label = "all-members"

[significance]
runs = 1000
# seed = 42
# workers = 4

[defaults]
format = "text"
"#;

/// Project-level configuration loaded from seabor.toml
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    /// Input tables
    #[serde(default)]
    pub data: DataConfig,

    /// Categorization options
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Permutation test settings
    #[serde(default)]
    pub significance: SignificanceConfig,

    /// Default CLI flags
    #[serde(default)]
    pub defaults: CliDefaults,

    /// Directory relative data paths are resolved against (not serialized)
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DataConfig {
    #[serde(default)]
    pub forms: Option<PathBuf>,

    #[serde(default)]
    pub languages: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub cross_family_label: CrossFamilyLabel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignificanceConfig {
    /// Replicates per test (default: 1000)
    #[serde(default = "default_runs")]
    pub runs: usize,

    /// Fixed seed; a fresh one is drawn per run when unset
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for SignificanceConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            seed: None,
            workers: None,
        }
    }
}

fn default_runs() -> usize {
    DEFAULT_REPLICATES
}

/// Default CLI flags that can be set in project config
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CliDefaults {
    /// Default output format (text, json, markdown)
    #[serde(default)]
    pub format: Option<String>,
}

impl ProjectConfig {
    /// Admixture options derived from the `[analysis]` table
    pub fn admixture_options(&self) -> AdmixtureOptions {
        AdmixtureOptions {
            cross_family_label: self.analysis.cross_family_label,
        }
    }

    /// Resolve a configured path against the config file's directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Forms table from `[data]`, resolved
    pub fn forms_path(&self) -> Option<PathBuf> {
        self.data.forms.as_deref().map(|p| self.resolve(p))
    }

    /// Language table from `[data]`, resolved
    pub fn languages_path(&self) -> Option<PathBuf> {
        self.data.languages.as_deref().map(|p| self.resolve(p))
    }
}

/// Load project configuration from `path`.
///
/// Returns default configuration if the file does not exist or cannot be
/// parsed; parse failures are logged.
pub fn load_project_config(path: &Path) -> ProjectConfig {
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return ProjectConfig::default();
    }

    match load_toml_config(path) {
        Ok(mut config) => {
            debug!("Loaded project config from {}", path.display());
            config.base_dir = path.parent().map(Path::to_path_buf);
            if config.significance.runs == 0 {
                warn!(
                    "{}: significance.runs must be positive, using {}",
                    path.display(),
                    DEFAULT_REPLICATES
                );
                config.significance.runs = DEFAULT_REPLICATES;
            }
            config
        }
        Err(e) => {
            warn!("Failed to load {}: {}", path.display(), e);
            ProjectConfig::default()
        }
    }
}

/// Load configuration from a TOML file
fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}
