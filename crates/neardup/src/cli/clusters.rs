//! The `neardup clusters` command: list persisted clusters for review.

use clap::Args;
use neardup_core::{Config, OutputWriter, SqliteStore};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use super::OutputFormat;

/// Arguments for the `clusters` command.
#[derive(Args, Debug)]
pub struct ClustersArgs {
    /// Only list clusters with at least this many members
    #[arg(long, default_value = "2")]
    pub min_size: usize,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "jsonl")]
    pub format: OutputFormat,

    /// Hash store (overrides `general.database_path`)
    #[arg(long, env = "NEARDUP_DB")]
    pub db: Option<PathBuf>,
}

/// Execute the clusters command.
pub async fn execute(args: ClustersArgs, config: Config) -> anyhow::Result<()> {
    let db_path = args.db.clone().unwrap_or_else(|| config.database_path());
    if !db_path.exists() {
        anyhow::bail!("No hash store at {}", db_path.display());
    }
    let store = SqliteStore::open(&db_path)?;

    let clusters = store.list_clusters(args.min_size.max(1))?;
    let counts = store.counts()?;
    tracing::info!(
        "{} cluster(s) with at least {} member(s); {} of {} record(s) clustered",
        clusters.len(),
        args.min_size,
        counts.clustered_records,
        counts.perceptual_records
    );

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = OutputWriter::new(sink, args.format.into(), true);
    writer.write_all(&clusters)?;
    writer.flush()?;

    Ok(())
}
