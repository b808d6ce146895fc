//! Core data types shared by the dedup and clustering passes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A file discovered during a corpus walk.
///
/// Transient: lives only for the duration of a dedup pass. `content_hash` is
/// `None` when hashing failed, in which case the file took no part in dedup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path as given in the input list
    pub path: PathBuf,

    /// File size in bytes (0 if metadata could not be read)
    pub size: u64,

    /// Hex-encoded BLAKE3 digest of the file contents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

/// Discriminant for the kind of hash a [`HashRecord`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashMethod {
    /// Cryptographic digest of the raw bytes
    Exact,
    /// Perceptual hash of the visual content
    Perceptual,
}

impl HashMethod {
    /// The value stored in the `hash_method` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            HashMethod::Exact => "exact",
            HashMethod::Perceptual => "perceptual",
        }
    }

    /// Parse a stored `hash_method` value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exact" => Some(Self::Exact),
            "perceptual" => Some(Self::Perceptual),
            _ => None,
        }
    }
}

impl fmt::Display for HashMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted hash row from the perceptual hash store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashRecord {
    /// Row identifier
    pub id: i64,

    /// Image the hash was computed for
    pub image_id: i64,

    /// Kind of hash
    pub hash_method: HashMethod,

    /// Hex string, verbatim as stored
    pub hash_value: String,

    /// Cluster the record was assigned to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<i64>,
}

/// One `(cluster id, record id)` pair pending persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub cluster_id: i64,
    pub record_id: i64,
}

/// A member of an in-memory cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub record_id: i64,
    pub image_id: i64,
}

/// A group of records judged near-duplicates of the cluster's seed.
///
/// `members[0]` is always the seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: i64,
    pub members: Vec<ClusterMember>,
}

impl Cluster {
    /// Image identifiers of all members, seed first.
    pub fn image_ids(&self) -> Vec<i64> {
        self.members.iter().map(|m| m.image_id).collect()
    }

    /// Persistence pairs for every member.
    pub fn assignments(&self) -> impl Iterator<Item = ClusterAssignment> + '_ {
        self.members.iter().map(move |m| ClusterAssignment {
            cluster_id: self.id,
            record_id: m.record_id,
        })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// An exact duplicate and the first-seen file it duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateEdge {
    pub duplicate_path: PathBuf,
    pub original_path: PathBuf,
}

/// A per-file failure, rendered as `<path>: <reason>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Outcome of an exact dedup pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupReport {
    /// Every file seen, in input order
    pub records: Vec<FileRecord>,

    /// First-seen paths, in input order
    pub unique: Vec<PathBuf>,

    /// Later occurrences of an already-seen digest
    pub duplicates: Vec<DuplicateEdge>,

    /// Files that could not be hashed
    pub errors: Vec<FileError>,
}

impl DedupReport {
    pub fn files_seen(&self) -> usize {
        self.records.len()
    }

    pub fn unique_count(&self) -> usize {
        self.unique.len()
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// A stored record whose hash value could not be used for clustering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub record_id: i64,
    pub image_id: i64,
    pub reason: String,
}

/// Outcome of a clustering pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterReport {
    /// Unclustered records fetched from the store
    pub records_fetched: usize,

    /// Non-empty buckets formed
    pub buckets: usize,

    /// Clusters emitted, singletons included
    pub clusters_formed: usize,

    /// Clusters with more than one member
    pub multi_member_clusters: usize,

    /// Assignment pairs committed
    pub records_updated: u64,

    /// First and last cluster ids issued by this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id_range: Option<(i64, i64)>,

    /// Records excluded because their hash was malformed
    pub rejected: Vec<RejectedRecord>,

    /// Flush retries performed after a failed batch
    pub retries: u32,
}

/// Outcome of an ingest pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub files_seen: usize,
    pub ingested: usize,
    pub skipped_existing: usize,
    pub errors: Vec<FileError>,
}

/// A persisted cluster, as listed for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCluster {
    pub cluster_id: i64,
    pub members: Vec<StoredClusterMember>,
}

/// One image in a persisted cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredClusterMember {
    pub image_id: i64,
    pub path: PathBuf,
    pub hash_value: String,
}
