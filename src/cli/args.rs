//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs,
    inspect::InspectArgs,
    interactive::InteractiveArgs,
    query::QueryArgs,
    rank::RankArgs,
    search::SearchArgs,
    stats::StatsArgs,
};

#[derive(Parser)]
#[command(name = "neo")]
#[command(author, version, about = "Explore past and future close approaches of near-Earth objects")]
#[command(long_about = "Loads a catalog of near-Earth objects (CSV) and their close approaches to Earth (JSON), then answers lookups and filtered queries.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct GlobalOpts {
    /// Path to CSV file of near-Earth objects (default: data/neos.csv)
    #[arg(long, global = true)]
    pub neofile: Option<PathBuf>,

    /// Path to JSON file of close approach data (default: data/cad.json)
    #[arg(long, global = true)]
    pub cadfile: Option<PathBuf>,

    /// Fail on malformed rows and approaches of unknown NEOs
    #[arg(long, global = true)]
    pub strict: bool,

    /// Output format
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect an NEO by primary designation or by name
    Inspect(InspectArgs),

    /// Query close approaches that match the given criteria
    Query(QueryArgs),

    /// Search NEOs by designation or name
    Search(SearchArgs),

    /// Show the closest approaches to Earth
    Closest(RankArgs),

    /// Show the fastest approaches to Earth
    Fastest(RankArgs),

    /// Show the most recent close approaches
    Recent(RankArgs),

    /// Show database statistics
    Stats(StatsArgs),

    /// Start an interactive session
    Interactive(InteractiveArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable sentences
    #[default]
    Text,
    /// Aligned table
    Table,
    /// CSV format (for spreadsheets)
    Csv,
    /// JSON format (for programming)
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}
