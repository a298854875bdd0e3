//! CLI argument definitions.

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `pulse`.
#[derive(Debug, Parser)]
#[command(name = "pulse", version, about = "Generate weekly review pulses from app-store feedback")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify a week's reviews into themes.
    Classify {
        /// Week to classify (Monday, YYYY-MM-DD); all available weeks
        /// when omitted.
        #[arg(long)]
        week: Option<String>,
        /// Reclassify even when theme data already exists.
        #[arg(long)]
        force: bool,
    },
    /// Generate the weekly pulse document from classified theme data.
    Generate {
        /// Week to generate (Monday, YYYY-MM-DD); all classified weeks
        /// when omitted.
        #[arg(long)]
        week: Option<String>,
        /// Regenerate even when a pulse already exists.
        #[arg(long)]
        force: bool,
    },
    /// Show per-week pipeline progress.
    Status,
}
