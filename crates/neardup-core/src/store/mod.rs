//! Perceptual hash store.
//!
//! The clustering pass talks to the store only through [`HashStore`]: one
//! fetch of unclustered records at the start of a run, and batched
//! assignment writes at the end. [`SqliteStore`] is the durable
//! implementation; it also carries the ingest and review queries.

mod queries;
mod sqlite;

pub use queries::StoreCounts;
pub use sqlite::SqliteStore;

use crate::error::StoreResult;
use crate::types::{ClusterAssignment, HashMethod, HashRecord};

/// Operations the clustering pass needs from a store.
pub trait HashStore {
    /// All records of `method` whose cluster id is unset, ordered by id.
    fn fetch_unclustered(&self, method: HashMethod) -> StoreResult<Vec<HashRecord>>;

    /// Apply one batch of assignments in a single transaction.
    ///
    /// A record that already has a cluster id is left untouched, so
    /// re-applying a committed batch is a no-op. Returns the number of
    /// records newly assigned.
    fn apply_cluster_assignments(&self, batch: &[ClusterAssignment]) -> StoreResult<usize>;

    /// Highest cluster id in use, if any.
    fn max_cluster_id(&self) -> StoreResult<Option<i64>>;
}
