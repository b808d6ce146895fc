//! Neardup CLI - exact dedup and near-duplicate clustering for photo corpora.
//!
//! Neardup drops byte-identical copies by content hash, records perceptual
//! hashes for what is left, and groups near-duplicates into clusters.
//!
//! # Usage
//!
//! ```bash
//! # Drop exact duplicates from a path list
//! neardup dedup --input paths.txt --output unique.txt
//!
//! # Record perceptual hashes for the unique files
//! neardup ingest --input unique.txt
//!
//! # Cluster everything not yet clustered
//! neardup cluster --threshold 5
//!
//! # Review clusters with more than one member
//! neardup clusters --min-size 2
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Neardup - exact dedup and near-duplicate clustering for photo corpora.
#[derive(Parser, Debug)]
#[command(name = "neardup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "NEARDUP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Find byte-identical duplicates and write the unique path list
    Dedup(cli::dedup::DedupArgs),

    /// Record content and perceptual hashes in the store
    Ingest(cli::ingest::IngestArgs),

    /// Group unclustered perceptual hashes into near-duplicate clusters
    Cluster(cli::cluster::ClusterArgs),

    /// List persisted clusters
    Clusters(cli::clusters::ClustersArgs),

    /// Clear every cluster assignment
    Reset(cli::reset::ResetArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let loaded = match &cli.config {
        Some(path) => neardup_core::Config::load_from(path),
        None => neardup_core::Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `neardup config path`."
            );
            neardup_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Neardup v{}", neardup_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Dedup(args) => cli::dedup::execute(args, config).await,
        Commands::Ingest(args) => cli::ingest::execute(args, config).await,
        Commands::Cluster(args) => cli::cluster::execute(args, config).await,
        Commands::Clusters(args) => cli::clusters::execute(args, config).await,
        Commands::Reset(args) => cli::reset::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, cli.config).await,
    }
}
