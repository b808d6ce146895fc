//! Error types for the dedup and clustering passes.
//!
//! Errors are organized by component so a caller can tell a per-file failure
//! (recoverable, logged, pass continues) from a store failure (fatal at
//! startup, or surfaced per batch with enough state to retry).

use std::path::PathBuf;
use thiserror::Error;

use crate::types::ClusterAssignment;

/// Top-level error type for neardup operations.
#[derive(Error, Debug)]
pub enum NeardupError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Perceptual hash store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A batched cluster write failed partway
    #[error(transparent)]
    BatchWrite(#[from] BatchWriteError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Hashing errors.
#[derive(Error, Debug)]
pub enum HashError {
    /// The file could not be opened, or a read failed partway
    #[error("IO error hashing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image could not be decoded for perceptual hashing
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// A stored hash value is not a valid fixed-length bit string
    #[error("Malformed hash on record {record_id} ({value:?}): {reason}")]
    Malformed {
        record_id: i64,
        value: String,
        reason: String,
    },
}

/// Perceptual hash store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be opened or initialized
    #[error("Failed to open store at {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A read query failed
    #[error("Query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// A write or commit failed
    #[error("Write failed: {0}")]
    Write(#[source] rusqlite::Error),
}

/// A cluster assignment flush that failed after committing some batches.
///
/// `committed` counts the pairs already durable; `remaining` holds every pair
/// from the failed batch onward, in order, so the caller can retry them.
#[derive(Error, Debug)]
#[error("Batch write failed after {committed} committed assignment(s), {} pending: {source}", remaining.len())]
pub struct BatchWriteError {
    pub committed: u64,
    pub remaining: Vec<ClusterAssignment>,
    #[source]
    pub source: StoreError,
}

/// Convenience type alias for neardup results.
pub type Result<T> = std::result::Result<T, NeardupError>;

/// Convenience type alias for store results.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
