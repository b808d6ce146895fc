//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// SQLite file holding images and their hash records
    pub database_path: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("~/.neardup/hashes.db"),
        }
    }
}

/// Exact dedup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Block size used when streaming files into the content digest
    pub read_block_size: usize,

    /// Extensions picked up by corpus discovery
    pub supported_formats: Vec<String>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            read_block_size: 65536,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "nef".to_string(),
                "heic".to_string(),
            ],
        }
    }
}

/// Near-duplicate clustering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Maximum Hamming distance (bits) from a cluster seed
    pub distance_threshold: u32,

    /// Hex characters of the hash used as the bucket key
    pub bucket_prefix_length: usize,

    /// Assignments committed per transaction
    pub batch_size: usize,

    /// Expected length of every stored perceptual hash, in hex characters
    pub hash_hex_length: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 5,
            bucket_prefix_length: 4,
            batch_size: 1000,
            hash_hex_length: 16,
        }
    }
}

/// Pipeline settings for backpressure and retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max paths buffered between the enumerator and the hasher
    pub buffer_size: usize,

    /// Max retry attempts for a failed batch write
    pub retry_attempts: u32,

    /// Base delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_size: 100,
            retry_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

/// Perceptual hash computation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptualConfig {
    /// Edge length of the hash grid (8 gives a 64-bit hash)
    pub hash_size: u32,
}

impl Default for PerceptualConfig {
    fn default() -> Self {
        Self { hash_size: 8 }
    }
}

impl PerceptualConfig {
    /// Length of the hex encoding produced for this grid size.
    pub fn hex_length(&self) -> usize {
        let bits = (self.hash_size as usize) * (self.hash_size as usize);
        bits.div_ceil(8) * 2
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
