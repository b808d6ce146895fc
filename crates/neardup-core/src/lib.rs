//! Neardup Core - exact dedup and near-duplicate image clustering.
//!
//! Two passes over a photo corpus:
//!
//! ```text
//! Exact:      path list → content hash → first-seen index → unique list + duplicates
//! Perceptual: store → prefix buckets → greedy clusters → batched cluster id writes
//! ```
//!
//! The perceptual pass reads hash records from a [`store::HashStore`];
//! [`Ingestor`] fills a [`SqliteStore`] with them.
//!
//! # Usage
//!
//! ```rust,ignore
//! use neardup_core::{ClusterPass, Config, SqliteStore};
//!
//! fn main() -> neardup_core::Result<()> {
//!     let config = Config::load()?;
//!     let store = SqliteStore::open(&config.database_path())?;
//!
//!     let report = ClusterPass::new(&config).run(&store)?;
//!     println!("{} clusters", report.clusters_formed);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod cluster;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod retry;
pub mod store;
pub mod types;

// Re-exports for convenient access
pub use cluster::{ClusterPass, GreedyClusterBuilder};
pub use config::Config;
pub use error::{BatchWriteError, ConfigError, HashError, NeardupError, Result, StoreError};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{DedupPass, Ingestor};
pub use store::{HashStore, SqliteStore};
pub use types::{ClusterReport, DedupReport, FileRecord, HashMethod, HashRecord, IngestReport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
