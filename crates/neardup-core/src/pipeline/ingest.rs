//! Ingest: record images and their hashes in the store.
//!
//! Each new path gets an image row plus one exact and one perceptual hash
//! record, written in a single transaction. Paths already present are
//! skipped, so re-ingesting a corpus only adds what is new.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{HashError, StoreError};
use crate::store::SqliteStore;
use crate::types::{FileError, IngestReport};

use super::hash::ContentHasher;
use super::perceptual::PerceptualHasher;

/// Outcome for a single ingested path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Ingested,
    AlreadyPresent,
    Failed,
}

pub struct Ingestor {
    content: ContentHasher,
    perceptual: PerceptualHasher,
}

impl Ingestor {
    pub fn new(config: &Config) -> Self {
        Self {
            content: ContentHasher::from_config(&config.dedup),
            perceptual: PerceptualHasher::new(&config.perceptual),
        }
    }

    /// Ingest every path in order.
    ///
    /// Files that cannot be read or decoded are reported in `errors` and the
    /// run continues; a store failure aborts it.
    pub fn run<F>(
        &self,
        store: &SqliteStore,
        paths: &[PathBuf],
        mut on_file: F,
    ) -> Result<IngestReport, StoreError>
    where
        F: FnMut(&Path, IngestOutcome),
    {
        let mut report = IngestReport {
            files_seen: paths.len(),
            ..Default::default()
        };

        for path in paths {
            let key = path.to_string_lossy();
            if store.image_exists(&key)? {
                tracing::debug!("Already ingested: {:?}", path);
                report.skipped_existing += 1;
                on_file(path, IngestOutcome::AlreadyPresent);
                continue;
            }

            let hashed = self.hash(path);
            let (size, digest, phash) = match hashed {
                Ok(hashes) => hashes,
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                    report.errors.push(FileError {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                    on_file(path, IngestOutcome::Failed);
                    continue;
                }
            };

            match store.ingest_image(&key, size, &digest, &phash)? {
                Some(_) => {
                    report.ingested += 1;
                    on_file(path, IngestOutcome::Ingested);
                }
                None => {
                    report.skipped_existing += 1;
                    on_file(path, IngestOutcome::AlreadyPresent);
                }
            }
        }

        tracing::info!(
            "Ingest complete: {} seen, {} ingested, {} already present, {} error(s)",
            report.files_seen,
            report.ingested,
            report.skipped_existing,
            report.errors.len()
        );
        Ok(report)
    }

    fn hash(&self, path: &Path) -> Result<(u64, String, String), HashError> {
        let size = std::fs::metadata(path)
            .map_err(|source| HashError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        let digest = self.content.hash(path)?;
        let phash = self.perceptual.hash_file(path)?;
        Ok((size, digest, phash))
    }
}
