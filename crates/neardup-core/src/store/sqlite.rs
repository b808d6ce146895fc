//! SQLite connection handling and schema setup.

use rusqlite::{params, Connection};
use std::path::Path;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::types::{ClusterAssignment, HashMethod, HashRecord};

use super::HashStore;

const SCHEMA_VERSION: i64 = 1;

/// A SQLite-backed perceptual hash store.
///
/// Constructed once per run and passed to each component that needs it.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the store at `path`.
    ///
    /// Any failure here is a connect error: no pass should start without a
    /// usable store.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let connect_err = |source| StoreError::Connect {
            path: path.to_path_buf(),
            source,
        };
        let conn = Connection::open(path).map_err(connect_err)?;
        let store = SqliteStore { conn };
        store.configure_pragmas().map_err(connect_err)?;
        store.migrate_schema().map_err(connect_err)?;
        debug!("Opened hash store at {:?}", path);
        Ok(store)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let connect_err = |source| StoreError::Connect {
            path: ":memory:".into(),
            source,
        };
        let conn = Connection::open_in_memory().map_err(connect_err)?;
        let store = SqliteStore { conn };
        store.configure_pragmas().map_err(connect_err)?;
        store.migrate_schema().map_err(connect_err)?;
        Ok(store)
    }

    fn configure_pragmas(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA cache_size = -64000;
             PRAGMA busy_timeout = 5000;",
        )?;
        debug!("SQLite pragmas configured (WAL mode, 64MB cache)");
        Ok(())
    }

    fn migrate_schema(&self) -> rusqlite::Result<()> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version > SCHEMA_VERSION {
            debug!(
                "Store schema version {} is newer than {}, opening as-is",
                version, SCHEMA_VERSION
            );
            return Ok(());
        }

        self.conn.execute_batch(include_str!("schema.sql"))?;
        debug!("SQLite schema initialized (version {})", SCHEMA_VERSION);
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl HashStore for SqliteStore {
    fn fetch_unclustered(&self, method: HashMethod) -> StoreResult<Vec<HashRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, image_id, hash_value, cluster_id FROM image_hashes \
             WHERE hash_method = ?1 AND cluster_id IS NULL \
             ORDER BY id",
        )?;

        let records = stmt
            .query_map(params![method.as_str()], |row| {
                Ok(HashRecord {
                    id: row.get(0)?,
                    image_id: row.get(1)?,
                    hash_method: method,
                    hash_value: row.get(2)?,
                    cluster_id: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!("Fetched {} unclustered {} record(s)", records.len(), method);
        Ok(records)
    }

    fn apply_cluster_assignments(&self, batch: &[ClusterAssignment]) -> StoreResult<usize> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(StoreError::Write)?;
        let mut changed = 0;
        {
            let mut stmt = tx
                .prepare_cached(
                    "UPDATE image_hashes SET cluster_id = ?1 \
                     WHERE id = ?2 AND cluster_id IS NULL",
                )
                .map_err(StoreError::Write)?;
            for pair in batch {
                changed += stmt
                    .execute(params![pair.cluster_id, pair.record_id])
                    .map_err(StoreError::Write)?;
            }
        }
        tx.commit().map_err(StoreError::Write)?;
        debug!(
            "Committed batch of {} assignment(s), {} newly assigned",
            batch.len(),
            changed
        );
        Ok(changed)
    }

    fn max_cluster_id(&self) -> StoreResult<Option<i64>> {
        let max = self
            .conn
            .query_row("SELECT MAX(cluster_id) FROM image_hashes", [], |row| {
                row.get(0)
            })?;
        Ok(max)
    }
}
