//! Command-line interface definitions for yelm-context.
//!
//! Global options (verbosity, color, config file, error format) apply to
//! every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Print the combined context for the current directory
//! yelm-context load
//!
//! # Same, as JSON, with an extra file supplied by an extension
//! yelm-context load ~/src/app --extension ~/ext/EXTRA.md --output json
//!
//! # Scanner statistics for a tree
//! yelm-context scan ~/src/app
//!
//! # Show what would be migrated, then do it
//! yelm-context migrate ~/src/app
//! yelm-context migrate ~/src/app --execute
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Hierarchical discovery of context instruction files.
///
/// Finds agents.md / CLAUDE.md / GEMINI.md style files in global, ancestor
/// and descendant directories and prints their combined content.
#[derive(Debug, Parser)]
#[command(name = "yelm-context")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Path to a config file (default: platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Discover context files and print their combined content
    Load(LoadArgs),
    /// Scan a tree and report what the scanner sees
    Scan(ScanArgs),
    /// Detect legacy context files and optionally migrate them
    Migrate(MigrateArgs),
}

/// Arguments for the load subcommand.
#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Working directory (default: current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Extra context file to append (can be specified multiple times)
    #[arg(short, long = "extension", value_name = "FILE")]
    pub extension_files: Vec<PathBuf>,

    /// Do not honor the working directory's .gitignore
    #[arg(long)]
    pub no_gitignore: bool,

    /// Bypass the discovery cache
    #[arg(long)]
    pub no_cache: bool,

    /// Log per-step discovery summaries
    #[arg(long)]
    pub debug: bool,

    /// Only list the discovered files (and cache counters)
    #[arg(long)]
    pub list: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan (default: current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Override the configured depth limit
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Override the configured directory limit
    #[arg(long, value_name = "N")]
    pub max_dirs: Option<usize>,

    /// Additional directory names or globs to skip (can be repeated)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the migrate subcommand.
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Directory to search (default: current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Perform the migration instead of only printing the plan
    #[arg(long)]
    pub execute: bool,

    /// Migrate even if the plan has conflicts, overwriting existing targets
    #[arg(long, requires = "execute")]
    pub force: bool,

    /// Skip legacy global directories
    #[arg(long)]
    pub no_global: bool,

    /// Copy files instead of renaming or moving them
    #[arg(long)]
    pub keep_originals: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
