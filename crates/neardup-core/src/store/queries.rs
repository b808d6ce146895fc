use rusqlite::{params, OptionalExtension};
use std::path::PathBuf;
use tracing::debug;

use super::sqlite::SqliteStore;
use crate::error::{StoreError, StoreResult};
use crate::types::{HashMethod, HashRecord, StoredCluster, StoredClusterMember};

/// Row counts for a status summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub images: i64,
    pub perceptual_records: i64,
    pub clustered_records: i64,
    pub clusters: i64,
}

fn read_hash_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<HashRecord> {
    let method: String = row.get(2)?;
    let hash_method = HashMethod::parse(&method).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown hash method {method:?}").into(),
        )
    })?;
    Ok(HashRecord {
        id: row.get(0)?,
        image_id: row.get(1)?,
        hash_method,
        hash_value: row.get(3)?,
        cluster_id: row.get(4)?,
    })
}

impl SqliteStore {
    // ── Images ───────────────────────────────────────────────────

    /// Insert an image row. Returns `None` if the path is already present.
    pub fn insert_image(
        &self,
        path: &str,
        file_size: u64,
        content_hash: Option<&str>,
    ) -> StoreResult<Option<i64>> {
        let inserted = self
            .connection()
            .execute(
                "INSERT OR IGNORE INTO images (path, file_size, content_hash) VALUES (?1, ?2, ?3)",
                params![path, file_size as i64, content_hash],
            )
            .map_err(StoreError::Write)?;
        if inserted == 0 {
            return Ok(None);
        }
        Ok(Some(self.connection().last_insert_rowid()))
    }

    pub fn image_exists(&self, path: &str) -> StoreResult<bool> {
        let found = self
            .connection()
            .query_row("SELECT 1 FROM images WHERE path = ?1", params![path], |_| {
                Ok(())
            })
            .optional()?;
        Ok(found.is_some())
    }

    /// Insert one hash record and return its id.
    pub fn insert_hash(
        &self,
        image_id: i64,
        method: HashMethod,
        hash_value: &str,
    ) -> StoreResult<i64> {
        self.connection()
            .execute(
                "INSERT INTO image_hashes (image_id, hash_method, hash_value) VALUES (?1, ?2, ?3)",
                params![image_id, method.as_str(), hash_value],
            )
            .map_err(StoreError::Write)?;
        Ok(self.connection().last_insert_rowid())
    }

    /// Insert an image with its exact and perceptual hashes atomically.
    ///
    /// Returns `None`, writing nothing, if the path is already present.
    pub fn ingest_image(
        &self,
        path: &str,
        file_size: u64,
        content_hash: &str,
        perceptual_hash: &str,
    ) -> StoreResult<Option<i64>> {
        let tx = self
            .connection()
            .unchecked_transaction()
            .map_err(StoreError::Write)?;
        let image_id = match self.insert_image(path, file_size, Some(content_hash))? {
            Some(id) => id,
            None => return Ok(None),
        };
        self.insert_hash(image_id, HashMethod::Exact, content_hash)?;
        self.insert_hash(image_id, HashMethod::Perceptual, perceptual_hash)?;
        tx.commit().map_err(StoreError::Write)?;
        Ok(Some(image_id))
    }

    // ── Hash records ─────────────────────────────────────────────

    /// Every hash record, ordered by id.
    pub fn hash_records(&self) -> StoreResult<Vec<HashRecord>> {
        let mut stmt = self.connection().prepare(
            "SELECT id, image_id, hash_method, hash_value, cluster_id \
             FROM image_hashes ORDER BY id",
        )?;
        let records = stmt
            .query_map([], read_hash_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    // ── Clusters ─────────────────────────────────────────────────

    /// Persisted clusters with at least `min_size` perceptual members,
    /// ordered by cluster id; members ordered by record id.
    pub fn list_clusters(&self, min_size: usize) -> StoreResult<Vec<StoredCluster>> {
        let mut stmt = self.connection().prepare(
            "SELECT h.cluster_id, h.image_id, i.path, h.hash_value \
             FROM image_hashes h \
             JOIN images i ON i.id = h.image_id \
             WHERE h.hash_method = 'perceptual' AND h.cluster_id IN ( \
                 SELECT cluster_id FROM image_hashes \
                 WHERE hash_method = 'perceptual' AND cluster_id IS NOT NULL \
                 GROUP BY cluster_id HAVING COUNT(*) >= ?1) \
             ORDER BY h.cluster_id, h.id",
        )?;

        let rows = stmt
            .query_map(params![min_size as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    StoredClusterMember {
                        image_id: row.get(1)?,
                        path: PathBuf::from(row.get::<_, String>(2)?),
                        hash_value: row.get(3)?,
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut clusters: Vec<StoredCluster> = Vec::new();
        for (cluster_id, member) in rows {
            match clusters.last_mut() {
                Some(last) if last.cluster_id == cluster_id => last.members.push(member),
                _ => clusters.push(StoredCluster {
                    cluster_id,
                    members: vec![member],
                }),
            }
        }
        Ok(clusters)
    }

    /// Clear every cluster assignment so all records are clustered afresh.
    ///
    /// This is the only operation that unsets a cluster id.
    pub fn reset_clusters(&self) -> StoreResult<usize> {
        let cleared = self
            .connection()
            .execute(
                "UPDATE image_hashes SET cluster_id = NULL WHERE cluster_id IS NOT NULL",
                [],
            )
            .map_err(StoreError::Write)?;
        debug!("Reset {} cluster assignment(s)", cleared);
        Ok(cleared)
    }

    pub fn counts(&self) -> StoreResult<StoreCounts> {
        let counts = self.connection().query_row(
            "SELECT \
                 (SELECT COUNT(*) FROM images), \
                 (SELECT COUNT(*) FROM image_hashes WHERE hash_method = 'perceptual'), \
                 (SELECT COUNT(*) FROM image_hashes \
                  WHERE hash_method = 'perceptual' AND cluster_id IS NOT NULL), \
                 (SELECT COUNT(DISTINCT cluster_id) FROM image_hashes \
                  WHERE cluster_id IS NOT NULL)",
            [],
            |row| {
                Ok(StoreCounts {
                    images: row.get(0)?,
                    perceptual_records: row.get(1)?,
                    clustered_records: row.get(2)?,
                    clusters: row.get(3)?,
                })
            },
        )?;
        Ok(counts)
    }
}
