//! Content hashing for exact deduplication.

use blake3::Hasher as Blake3Hasher;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::config::DedupConfig;
use crate::error::HashError;

/// Default read block size (64KB).
pub const DEFAULT_BLOCK_SIZE: usize = 65536;

/// Streams file contents into a BLAKE3 digest in fixed-size blocks.
///
/// Memory use is bounded by the block size regardless of file size, and the
/// digest does not depend on the block size.
#[derive(Debug, Clone)]
pub struct ContentHasher {
    block_size: usize,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE)
    }
}

impl ContentHasher {
    /// Create a hasher that reads `block_size` bytes at a time.
    ///
    /// A zero block size is clamped to one byte.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size: block_size.max(1),
        }
    }

    /// Create a hasher from the dedup configuration.
    pub fn from_config(config: &DedupConfig) -> Self {
        Self::new(config.read_block_size)
    }

    /// Hash a file's contents, returning the hex-encoded digest.
    ///
    /// Fails if the file cannot be opened or a read fails partway; a failed
    /// hash must not take part in dedup decisions.
    pub fn hash(&self, path: &Path) -> Result<String, HashError> {
        let io_err = |source| HashError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let mut reader = BufReader::with_capacity(self.block_size, file);
        let mut hasher = Blake3Hasher::new();
        let mut buffer = vec![0u8; self.block_size];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_err(e)),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hasher.finalize().to_hex().to_string())
    }

    /// Hash an in-memory byte buffer.
    ///
    /// Produces the same digest as [`ContentHasher::hash`] on a file with
    /// these bytes.
    pub fn hash_bytes(data: &[u8]) -> String {
        let mut hasher = Blake3Hasher::new();
        hasher.update(data);
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_hash_format() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.jpg", b"Hello, World!");

        let hash = ContentHasher::default().hash(&path).unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_digest_invariant_to_block_size() {
        let dir = TempDir::new().unwrap();
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let path = write_file(&dir, "big.nef", &content);

        let expected = ContentHasher::hash_bytes(&content);
        for block_size in [1, 7, 4096, 65536, 1 << 20] {
            let hash = ContentHasher::new(block_size).hash(&path).unwrap();
            assert_eq!(hash, expected, "block size {block_size}");
        }
    }

    #[test]
    fn test_identical_files_same_hash() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.jpg", b"Identical content");
        let b = write_file(&dir, "b.jpg", b"Identical content");
        let c = write_file(&dir, "c.jpg", b"Different content");

        let hasher = ContentHasher::default();
        assert_eq!(hasher.hash(&a).unwrap(), hasher.hash(&b).unwrap());
        assert_ne!(hasher.hash(&a).unwrap(), hasher.hash(&c).unwrap());
    }

    #[test]
    fn test_empty_file_hashes() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.png", b"");
        let hash = ContentHasher::default().hash(&path).unwrap();
        assert_eq!(hash, ContentHasher::hash_bytes(b""));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ContentHasher::default()
            .hash(Path::new("/definitely/not/here.jpg"))
            .unwrap_err();
        assert!(matches!(err, HashError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.jpg"));
    }

    #[test]
    fn test_zero_block_size_is_clamped() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "tiny.jpg", b"abc");
        assert_eq!(
            ContentHasher::new(0).hash(&path).unwrap(),
            ContentHasher::hash_bytes(b"abc")
        );
    }
}
