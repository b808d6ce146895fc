//! Corpus discovery: find candidate image files under one or more roots.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::DedupConfig;

/// Discovers image files in directories.
pub struct FileDiscovery {
    config: DedupConfig,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    /// Discover supported files under every root, in root order.
    ///
    /// Files are sorted by path within each root, and roots keep the order
    /// given, so the result (and with it the dedup tie-break) is
    /// deterministic. Missing roots, such as unmounted volumes, are skipped
    /// with a warning.
    pub fn discover_all(&self, roots: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for root in roots {
            if !root.exists() {
                tracing::warn!("Root {:?} not found or not mounted, skipping", root);
                continue;
            }
            let found = self.discover(root);
            tracing::debug!("Found {} candidate file(s) under {:?}", found.len(), root);
            files.extend(found);
        }
        files
    }

    /// Discover all supported files at a path.
    ///
    /// If path is a file, returns it if supported.
    /// If path is a directory, recursively finds all supported files.
    /// Entries the walk cannot read are skipped with a warning.
    pub fn discover(&self, path: &Path) -> Vec<PathBuf> {
        if path.is_file() {
            if self.is_supported(path) {
                return vec![path.to_path_buf()];
            }
            return vec![];
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(path).into_iter() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {:?}: {}", path, e);
                    continue;
                }
            };
            let entry_path = entry.path();
            if entry.file_type().is_file() && self.is_supported(entry_path) {
                files.push(entry_path.to_path_buf());
            }
        }

        // Sort by path for deterministic ordering
        files.sort();
        files
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.to_lowercase() == ext_lower)
            })
            .unwrap_or(false)
    }
}
