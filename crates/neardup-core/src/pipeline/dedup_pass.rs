//! Exact dedup pass: enumerator → bounded queue → hasher → dedup index.
//!
//! The enumerator and the hasher run as separate tasks joined by a bounded
//! channel, but files are hashed and classified strictly in input order, so
//! the first-seen tie-break is the order of the input list.

use std::path::PathBuf;

use crate::config::{Config, PipelineConfig};
use crate::error::HashError;
use crate::types::{DedupReport, DuplicateEdge, FileError, FileRecord};

use super::channel::{bounded_channel, PipelineStage};
use super::dedup::{Classification, DedupIndex};
use super::hash::ContentHasher;

/// A file after the hashing stage.
struct HashedFile {
    path: PathBuf,
    size: u64,
    digest: Result<String, HashError>,
}

/// Runs content hashing and first-seen-wins classification over a path list.
pub struct DedupPass {
    hasher: ContentHasher,
    pipeline: PipelineConfig,
}

impl DedupPass {
    pub fn new(config: &Config) -> Self {
        Self {
            hasher: ContentHasher::from_config(&config.dedup),
            pipeline: config.pipeline.clone(),
        }
    }

    /// Hash and classify every path, in order.
    pub async fn run(&self, paths: Vec<PathBuf>) -> DedupReport {
        self.run_with_progress(paths, |_| {}).await
    }

    /// Like [`DedupPass::run`], calling `on_file` after each file is classified.
    ///
    /// Files that fail to hash are reported in `errors` and are neither
    /// unique nor duplicate.
    pub async fn run_with_progress<F>(&self, paths: Vec<PathBuf>, mut on_file: F) -> DedupReport
    where
        F: FnMut(&FileRecord),
    {
        let total = paths.len();
        let (path_tx, path_rx) = bounded_channel::<PathBuf>(&self.pipeline);
        let (hashed_tx, mut hashed_rx) = bounded_channel::<HashedFile>(&self.pipeline);

        let producer = tokio::spawn(async move {
            for path in paths {
                if path_tx.send(path).await.is_err() {
                    break;
                }
            }
        });

        let hasher = self.hasher.clone();
        let stage = PipelineStage::new(path_rx, hashed_tx);
        let worker = tokio::spawn(async move {
            stage
                .run(move |path| {
                    let hasher = hasher.clone();
                    async move { hash_file(hasher, path).await }
                })
                .await
        });

        let mut index = DedupIndex::new();
        let mut report = DedupReport::default();

        while let Some(hashed) = hashed_rx.recv().await {
            let record = match hashed.digest {
                Ok(digest) => {
                    match index.observe(&hashed.path, &digest) {
                        Classification::Unique => report.unique.push(hashed.path.clone()),
                        Classification::DuplicateOf(original) => {
                            tracing::debug!("{:?} duplicates {:?}", hashed.path, original);
                            report.duplicates.push(DuplicateEdge {
                                duplicate_path: hashed.path.clone(),
                                original_path: original,
                            });
                        }
                    }
                    FileRecord {
                        path: hashed.path,
                        size: hashed.size,
                        content_hash: Some(digest),
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", hashed.path, e);
                    report.errors.push(FileError {
                        path: hashed.path.clone(),
                        reason: failure_reason(&e),
                    });
                    FileRecord {
                        path: hashed.path,
                        size: hashed.size,
                        content_hash: None,
                    }
                }
            };
            on_file(&record);
            report.records.push(record);
        }

        if let Err(e) = producer.await {
            tracing::error!("Path enumerator task failed: {}", e);
        }
        if let Err(e) = worker.await {
            tracing::error!("Hasher task failed: {}", e);
        }
        if report.records.len() != total {
            tracing::error!(
                "Dedup pass saw {} of {} input path(s)",
                report.records.len(),
                total
            );
        }

        tracing::info!(
            "Dedup complete: {} seen, {} unique, {} duplicate(s), {} error(s)",
            report.files_seen(),
            report.unique_count(),
            report.duplicate_count(),
            report.error_count()
        );
        report
    }
}

/// Hash one file on the blocking pool.
async fn hash_file(hasher: ContentHasher, path: PathBuf) -> HashedFile {
    let fallback = path.clone();
    let task = tokio::task::spawn_blocking(move || {
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let digest = hasher.hash(&path);
        HashedFile { path, size, digest }
    });

    match task.await {
        Ok(hashed) => hashed,
        Err(e) => HashedFile {
            path: fallback.clone(),
            size: 0,
            digest: Err(HashError::Io {
                path: fallback,
                source: std::io::Error::other(format!("hashing task failed: {e}")),
            }),
        },
    }
}

/// The reason recorded in the error log; the path is carried separately.
fn failure_reason(error: &HashError) -> String {
    match error {
        HashError::Io { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}
