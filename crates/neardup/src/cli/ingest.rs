//! The `neardup ingest` command: record hashes for images in the store.

use clap::Args;
use neardup_core::output::{read_path_list, write_error_log};
use neardup_core::pipeline::{FileDiscovery, IngestOutcome};
use neardup_core::{Config, Ingestor, SqliteStore};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use super::progress::{create_progress_bar, print_summary, tick, Row};

/// Arguments for the `ingest` command.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// File listing one image path per line, e.g. the output of `dedup`
    #[arg(short, long, required_unless_present = "root", conflicts_with = "root")]
    pub input: Option<PathBuf>,

    /// Walk these directories instead of reading a path list
    #[arg(long, num_args = 1..)]
    pub root: Vec<PathBuf>,

    /// Hash store (overrides `general.database_path`)
    #[arg(long, env = "NEARDUP_DB")]
    pub db: Option<PathBuf>,

    /// Error log, appended to
    #[arg(long, default_value = "ingest_errors.log")]
    pub error_log: PathBuf,
}

/// Execute the ingest command.
pub async fn execute(args: IngestArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(db) = &args.db {
        config.general.database_path = db.clone();
    }
    let config = config.validated()?;

    let (paths, unreadable) = match &args.input {
        Some(input) => {
            let file = File::open(input).map_err(|e| {
                anyhow::anyhow!("Failed to open path list {}: {e}", input.display())
            })?;
            let list = read_path_list(BufReader::new(file))?;
            (list.paths, list.errors)
        }
        None => (
            FileDiscovery::new(config.dedup.clone()).discover_all(&args.root),
            Vec::new(),
        ),
    };
    if !unreadable.is_empty() {
        tracing::warn!("Skipping {} undecodable line(s) in the path list", unreadable.len());
    }
    if paths.is_empty() {
        anyhow::bail!("No input paths");
    }

    // Open the store before hashing anything: a bad path is fatal up front.
    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteStore::open(&db_path)?;
    tracing::info!("Ingesting {} path(s) into {:?}", paths.len(), db_path);

    let progress = create_progress_bar(paths.len() as u64);
    let start = Instant::now();
    let ingestor = Ingestor::new(&config);
    let pb = progress.clone();
    let mut report = tokio::task::spawn_blocking(move || {
        let mut done = 0u64;
        ingestor.run(&store, &paths, |path, outcome| {
            done += 1;
            if outcome == IngestOutcome::Failed {
                pb.println(format!("failed: {}", path.display()));
            }
            tick(&pb, done, start.elapsed());
        })
    })
    .await??;
    progress.finish_and_clear();
    report.errors.extend(unreadable);

    if !report.errors.is_empty() {
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&args.error_log)?;
        write_error_log(BufWriter::new(log), &report.errors)?;
    }

    print_summary(
        "Ingest Summary",
        &[
            Row::new("Files seen", report.files_seen),
            Row::new("Ingested", report.ingested),
            Row::nonzero("Already known", report.skipped_existing),
            Row::nonzero("Errors", report.errors.len()),
        ],
        start.elapsed(),
    );
    if !report.errors.is_empty() {
        eprintln!("    Error log: {}", args.error_log.display());
    }

    Ok(())
}
