//! The `neardup reset` command: clear cluster assignments.

use clap::Args;
use neardup_core::{Config, SqliteStore};
use std::path::PathBuf;

/// Arguments for the `reset` command.
#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Required: every record will be clustered again on the next run
    #[arg(long)]
    pub yes: bool,

    /// Hash store (overrides `general.database_path`)
    #[arg(long, env = "NEARDUP_DB")]
    pub db: Option<PathBuf>,
}

/// Execute the reset command.
pub async fn execute(args: ResetArgs, config: Config) -> anyhow::Result<()> {
    if !args.yes {
        anyhow::bail!("Refusing to clear cluster assignments without --yes");
    }

    let db_path = args.db.clone().unwrap_or_else(|| config.database_path());
    if !db_path.exists() {
        anyhow::bail!("No hash store at {}", db_path.display());
    }
    let store = SqliteStore::open(&db_path)?;

    let cleared = store.reset_clusters()?;
    tracing::info!("Cleared {} cluster assignment(s)", cleared);
    println!("Cleared {cleared} cluster assignment(s) in {}", db_path.display());
    Ok(())
}
