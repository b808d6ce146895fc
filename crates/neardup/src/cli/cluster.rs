//! The `neardup cluster` command: group unclustered perceptual hashes.

use clap::Args;
use neardup_core::{ClusterPass, ClusterReport, Config, NeardupError, SqliteStore};
use std::path::PathBuf;
use std::time::Instant;

use super::progress::{print_summary, Row};

/// Arguments for the `cluster` command.
#[derive(Args, Debug)]
pub struct ClusterArgs {
    /// Maximum Hamming distance, in bits, from a cluster's seed
    #[arg(short, long)]
    pub threshold: Option<u32>,

    /// Bucket key length, in hex characters
    #[arg(short, long)]
    pub prefix: Option<usize>,

    /// Assignments committed per transaction
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Hash store (overrides `general.database_path`)
    #[arg(long, env = "NEARDUP_DB")]
    pub db: Option<PathBuf>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Execute the cluster command.
pub async fn execute(args: ClusterArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(threshold) = args.threshold {
        config.clustering.distance_threshold = threshold;
    }
    if let Some(prefix) = args.prefix {
        config.clustering.bucket_prefix_length = prefix;
    }
    if let Some(batch_size) = args.batch_size {
        config.clustering.batch_size = batch_size;
    }
    if let Some(db) = &args.db {
        config.general.database_path = db.clone();
    }
    let config = config.validated()?;

    let db_path = config.database_path();
    if !db_path.exists() {
        anyhow::bail!(
            "No hash store at {}. Run `neardup ingest` first.",
            db_path.display()
        );
    }
    let store = SqliteStore::open(&db_path)?;

    tracing::info!(
        "Clustering with threshold {} bit(s), prefix {} hex char(s), batch size {}",
        config.clustering.distance_threshold,
        config.clustering.bucket_prefix_length,
        config.clustering.batch_size
    );

    let start = Instant::now();
    let pass = ClusterPass::new(&config);
    let result = tokio::task::spawn_blocking(move || pass.run(&store)).await?;

    let report = match result {
        Ok(report) => report,
        Err(NeardupError::BatchWrite(e)) => {
            eprintln!(
                "Cluster write failed after {} committed assignment(s); {} left unassigned. \
                 Re-run `neardup cluster` to retry: unassigned records are picked up again.",
                e.committed,
                e.remaining.len()
            );
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    print_report(&report, start);
    Ok(())
}

fn print_report(report: &ClusterReport, start: Instant) {
    let range = match report.cluster_id_range {
        Some((first, last)) => format!("{first}-{last}"),
        None => "-".to_string(),
    };
    print_summary(
        "Cluster Summary",
        &[
            Row::new("Records", report.records_fetched),
            Row::new("Buckets", report.buckets),
            Row::new("Clusters", report.clusters_formed),
            Row::new("Multi-member", report.multi_member_clusters),
            Row::new("Updated", report.records_updated),
            Row::new("Cluster ids", range),
            Row::nonzero("Rejected", report.rejected.len()),
            Row::nonzero("Retries", report.retries),
        ],
        start.elapsed(),
    );
    for rejected in &report.rejected {
        eprintln!(
            "    rejected record {} (image {}): {}",
            rejected.record_id, rejected.image_id, rejected.reason
        );
    }
}
