//! First-seen-wins exact dedup index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Classification of one observed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// First file seen with this digest
    Unique,
    /// A later file whose digest was first seen at the given path
    DuplicateOf(PathBuf),
}

/// Maps each digest to the first path that produced it.
///
/// Classification is single-pass and order-sensitive: whichever path is
/// observed first for a digest becomes the original, and changing the
/// observation order changes which path that is.
#[derive(Debug, Default)]
pub struct DedupIndex {
    first_seen: HashMap<String, PathBuf>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `path` by its digest, recording it if the digest is new.
    pub fn observe(&mut self, path: &Path, digest: &str) -> Classification {
        match self.first_seen.get(digest) {
            Some(original) => Classification::DuplicateOf(original.clone()),
            None => {
                self.first_seen
                    .insert(digest.to_string(), path.to_path_buf());
                Classification::Unique
            }
        }
    }

    /// Number of distinct digests seen.
    pub fn len(&self) -> usize {
        self.first_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_seen.is_empty()
    }
}
