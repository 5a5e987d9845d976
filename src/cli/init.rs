//! Init command - write an example project config

use anyhow::{bail, Context, Result};
use console::style;
use seabor::config::EXAMPLE_CONFIG;
use std::path::Path;

/// Run the init command
pub fn run(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(config_path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!(
        "{} Created {}",
        style("✓").green(),
        style(config_path.display()).cyan()
    );
    println!("\nNext steps:");
    println!("  {} Point [data] forms at your wordlist", style("edit seabor.toml").cyan());
    println!("  {} Category shares per language", style("seabor admixture").cyan());
    println!(
        "  {} Test a concept list",
        style("seabor significance --concepts list.txt").cyan()
    );

    Ok(())
}
