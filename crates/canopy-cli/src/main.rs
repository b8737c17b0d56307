//! Canopy CLI - Command-line interface for Canopy
//!
//! This is the main entry point for users interacting with Canopy.
//! It feeds parsed analysis facts and git history into the engine and
//! prints ranked context, related-file suggestions and change
//! patterns.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "canopy")]
#[command(author = "Canopy Contributors")]
#[command(version)]
#[command(about = "A live relevance model for your codebase", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Canopy in a directory
    Init,

    /// Ingest analyzer output (a JSON file of per-file nodes/edges)
    Ingest {
        /// Path to the analysis JSON file
        analysis: PathBuf,
    },

    /// Import version-control history into the pattern miners
    History {
        /// How many days of history to read
        #[arg(long, default_value = "30")]
        days: i64,
    },

    /// Print the ranked context for a file
    Context {
        /// File to build context for (repo-relative path)
        file: String,
    },

    /// Suggest files related to a file
    Suggest {
        /// File to suggest relatives for
        file: String,

        /// Maximum suggestions to print
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show modification patterns involving a file
    Patterns {
        /// File to look up
        file: String,
    },

    /// Show engine status and statistics
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Init => commands::init(&cli.root),
        Commands::Ingest { analysis } => commands::ingest(&cli.root, &analysis).await,
        Commands::History { days } => commands::history(&cli.root, days).await,
        Commands::Context { file } => commands::context(&cli.root, &file).await,
        Commands::Suggest { file, limit } => commands::suggest(&cli.root, &file, limit).await,
        Commands::Patterns { file } => commands::patterns(&cli.root, &file).await,
        Commands::Status => commands::status(&cli.root).await,
    }
}
