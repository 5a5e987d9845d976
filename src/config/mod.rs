//! Configuration module for seabor
//!
//! This module handles:
//! - Project-level configuration (seabor.toml)
//! - Data paths and analysis options
//! - CLI defaults

mod project_config;

pub use project_config::{
    AnalysisConfig,
    CliDefaults,
    DataConfig,
    ProjectConfig,
    SignificanceConfig,
    CONFIG_FILE_NAME,
    EXAMPLE_CONFIG,
    load_project_config,
};
