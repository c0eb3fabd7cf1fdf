//! Archivist: merge captured JSONL records into a deduplicated, published archive.
//!
//! # Usage
//!
//! ```text
//! archivist run    [--config <path>] [--root <dir>] [--dry-run] [--force] [-v]
//! archivist merge  --output <file> [--archive <file>] <inputs>...
//! archivist status [--config <path>] [--root <dir>] [--json]
//! archivist init   [--root <dir>] [--force]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{init::InitArgs, merge::MergeArgs, run::RunArgs, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "archivist",
    version,
    about = "Merge and deduplicate captured JSONL records into a published archive",
    long_about = None,
)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline once: fetch, merge, publish, prune.
    Run(RunArgs),

    /// Merge explicit files into one deduplicated output.
    Merge(MergeArgs),

    /// Show pending inputs and what the next run would decide.
    Status(StatusArgs),

    /// Write a default archivist.yaml.
    Init(InitArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Merge(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Init(args) => args.run(),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
