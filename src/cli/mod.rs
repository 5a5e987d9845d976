//! CLI command definitions and handlers

mod admixture;
mod data;
mod init;
mod score;
mod significance;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// Parse a positive replicate count
fn parse_runs(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("runs must be at least 1".to_string())
    } else {
        Ok(n)
    }
}

/// seabor - Borrowing-aware admixture analysis for wordlists
#[derive(Parser, Debug)]
#[command(name = "seabor")]
#[command(
    version,
    about = "Measure how much of each language's vocabulary is inherited, unique or borrowed across families",
    long_about = "seabor reads a wordlist annotated with cognate and borrowing clusters, \
splits every language's vocabulary into inherited, singleton and cross-family borrowed \
shares, and tests whether a concept list resists borrowing more than the rest of the \
vocabulary with a permutation test.",
    after_help = "\
Examples:
  seabor init                                         Write an example seabor.toml
  seabor admixture --forms forms.csv                  Shares for every concept
  seabor admixture --concepts basic.txt --complement  Shares outside a concept list
  seabor score --concepts basic.txt                   Non-borrowed proportion per list
  seabor significance --concepts basic.txt --seed 1   Permutation test vs. the rest"
)]
pub struct Cli {
    /// Project config file
    #[arg(long, global = true, default_value = "seabor.toml")]
    pub config: PathBuf,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of parallel workers for permutation tests (1-64)
    #[arg(long, global = true, value_parser = parse_workers)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Input tables and categorization options shared by every analysis
#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    /// Forms table, CSV or TSV (default: [data] forms from the config)
    #[arg(long)]
    pub forms: Option<PathBuf>,

    /// Language table (default: [data] languages, else derived from forms)
    #[arg(long)]
    pub languages: Option<PathBuf>,

    /// Cross-family label mode: all-members or exclude-own
    #[arg(long, value_parser = ["all-members", "exclude-own"])]
    pub cross_family_label: Option<String>,
}

/// Output options shared by every report
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output format: text, json, markdown (or md)
    #[arg(long, short = 'f', value_parser = ["text", "json", "markdown", "md"])]
    pub format: Option<String>,

    /// Output file path (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a seabor.toml config file with example settings
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Per-language shares of inherited, singleton and borrowed forms
    #[command(after_help = "\
Examples:
  seabor admixture --forms forms.csv
  seabor admixture --concepts basic.txt --format markdown -o basic.md
  seabor admixture --concepts basic.txt --complement")]
    Admixture {
        #[command(flatten)]
        data: DataArgs,

        /// Concept list restricting the analysis (default: every concept)
        #[arg(long)]
        concepts: Option<PathBuf>,

        /// Analyse every concept not in --concepts instead
        #[arg(long, requires = "concepts")]
        complement: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Language-averaged non-borrowed proportion of concept lists
    Score {
        #[command(flatten)]
        data: DataArgs,

        /// Concept list to score; repeat for several lists
        #[arg(long)]
        concepts: Vec<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Permutation test: does a concept list borrow less than the rest?
    #[command(after_help = "\
Examples:
  seabor significance --concepts basic.txt
  seabor significance --concepts basic.txt --versus cultural.txt --runs 10000
  seabor significance --concepts basic.txt --seed 42 --workers 4 --format json")]
    Significance {
        #[command(flatten)]
        data: DataArgs,

        /// Concept list A
        #[arg(long)]
        concepts: PathBuf,

        /// Concept list B (default: the rest of the universe)
        #[arg(long)]
        versus: Option<PathBuf>,

        /// Concepts to resample from (default: every concept in the forms)
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Number of replicates (default: [significance] runs, else 1000)
        #[arg(long, value_parser = parse_runs)]
        runs: Option<usize>,

        /// Random seed; a fresh seed is drawn and reported when unset
        #[arg(long)]
        seed: Option<u64>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show version information
    Version,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { force } => init::run(&cli.config, force),

        Commands::Admixture {
            data,
            concepts,
            complement,
            output,
        } => {
            let config = seabor::config::load_project_config(&cli.config);
            admixture::run(&config, &data, concepts.as_deref(), complement, &output)
        }

        Commands::Score {
            data,
            concepts,
            output,
        } => {
            let config = seabor::config::load_project_config(&cli.config);
            score::run(&config, &data, &concepts, &output)
        }

        Commands::Significance {
            data,
            concepts,
            versus,
            universe,
            runs,
            seed,
            no_progress,
            output,
        } => {
            let config = seabor::config::load_project_config(&cli.config);
            significance::run(
                &config,
                &data,
                significance::TestArgs {
                    concepts: &concepts,
                    versus: versus.as_deref(),
                    universe: universe.as_deref(),
                    runs,
                    seed,
                    workers: cli.workers,
                    progress: !no_progress,
                },
                &output,
            )
        }

        Commands::Version => {
            println!("seabor {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
