//! Command line argument parsing for the termlight CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// termlight - rebuild token streams from term vectors and highlight text
#[derive(Parser, Debug, Clone)]
#[command(name = "termlight")]
#[command(about = "Rebuild token streams from stored term vectors and highlight query matches")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct TermlightArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl TermlightArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the token stream rebuilt from a field's term vector
    Tokens(TokensArgs),

    /// Highlight a text with a query, using the text's term vectors
    Highlight(HighlightArgs),
}

/// Arguments for dumping a token stream
#[derive(Parser, Debug, Clone)]
pub struct TokensArgs {
    /// Term vectors file (JSON)
    #[arg(value_name = "TERM_VECTORS")]
    pub term_vectors: PathBuf,

    /// Field to rebuild (default: the first field in the file)
    #[arg(long)]
    pub field: Option<String>,

    /// Skip occurrences starting after this offset
    #[arg(long)]
    pub max_start_offset: Option<usize>,
}

/// Arguments for highlighting
#[derive(Parser, Debug, Clone)]
pub struct HighlightArgs {
    /// Term vectors file (JSON)
    #[arg(value_name = "TERM_VECTORS")]
    pub term_vectors: PathBuf,

    /// File holding the field text the term vectors were built from
    #[arg(short, long, value_name = "TEXT_FILE")]
    pub text: PathBuf,

    /// Query file (JSON)
    #[arg(long, value_name = "QUERY_FILE")]
    pub query: PathBuf,

    /// Field to highlight (default: the first field in the file)
    #[arg(long)]
    pub field: Option<String>,

    /// Highlight configuration file (JSON); flags below override it
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Target fragment length in characters
    #[arg(long)]
    pub fragment_size: Option<usize>,

    /// Maximum number of fragments
    #[arg(short, long)]
    pub max_fragments: Option<usize>,

    /// Separator printed between fragments
    #[arg(long)]
    pub separator: Option<String>,

    /// Escape HTML in the output
    #[arg(long)]
    pub html_escape: bool,

    /// Return fragments in document order instead of score order
    #[arg(long)]
    pub document_order: bool,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
