//! Command-Line Interface

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// roomtrace - synchronize movement, conversation, and code recordings
#[derive(Parser, Debug)]
#[command(name = "roomtrace")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the synchronization pipeline over a set of CSV files
    Sync {
        /// Movement CSV files, one per tracked entity
        #[arg(short, long, required = true, num_args = 1..)]
        movement: Vec<PathBuf>,

        /// Conversation CSV file (shared across entities)
        #[arg(short = 't', long)]
        conversation: Option<PathBuf>,

        /// Code-interval CSV files
        #[arg(short = 'k', long, num_args = 0..)]
        codes: Vec<PathBuf>,

        /// Write the synchronized snapshot as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the configured stop threshold
        #[arg(long)]
        stop_threshold: Option<f64>,
    },

    /// Summarize a snapshot JSON previously written by `sync --output`
    Inspect {
        /// Snapshot file to read
        snapshot: PathBuf,
    },

    /// Validate a single CSV file against a schema without loading it
    Validate {
        /// File to check
        file: PathBuf,

        /// Which schema the file should satisfy
        #[arg(short, long, value_enum)]
        kind: SchemaKind,
    },

    /// View or manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// The three file roles the engine accepts
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SchemaKind {
    /// time, x, y
    Movement,
    /// time, speaker, talk
    Conversation,
    /// start, end
    Code,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write a default config file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Print the default config path
    Path,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
