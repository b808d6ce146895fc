//! Clustering pass orchestration: fetch → bucket → cluster → write.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{BatchWriteError, Result};
use crate::retry::{backoff_duration, is_retryable};
use crate::store::HashStore;
use crate::types::{Cluster, ClusterAssignment, ClusterReport, HashMethod, HashRecord, RejectedRecord};

use super::bucket::{Bucketer, Bucketing};
use super::greedy::{ClusterIdAllocator, GreedyClusterBuilder};
use super::writer::{BatchWriter, FlushStats};

/// In-memory result of bucketing and clustering one set of records.
#[derive(Debug)]
pub struct ClusterPlan {
    pub bucketing: Bucketing,
    pub clusters: Vec<Cluster>,
}

impl ClusterPlan {
    /// Every assignment pair, in cluster order.
    pub fn assignments(&self) -> Vec<ClusterAssignment> {
        self.clusters.iter().flat_map(Cluster::assignments).collect()
    }

    pub fn rejected(&self) -> Vec<RejectedRecord> {
        self.bucketing
            .rejected
            .iter()
            .map(|(record, _)| record.clone())
            .collect()
    }
}

/// Runs one clustering pass over the unclustered perceptual records of a store.
pub struct ClusterPass {
    bucketer: Bucketer,
    builder: GreedyClusterBuilder,
    batch_size: usize,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl ClusterPass {
    pub fn new(config: &Config) -> Self {
        Self {
            bucketer: Bucketer::from_config(&config.clustering),
            builder: GreedyClusterBuilder::new(config.clustering.distance_threshold),
            batch_size: config.clustering.batch_size,
            retry_attempts: config.pipeline.retry_attempts,
            retry_delay_ms: config.pipeline.retry_delay_ms,
        }
    }

    /// Bucket and cluster `records`, drawing ids from `ids`. Touches no store.
    pub fn plan(&self, records: Vec<HashRecord>, ids: &mut ClusterIdAllocator) -> ClusterPlan {
        let bucketing = self.bucketer.bucket(records);
        for (rejected, error) in &bucketing.rejected {
            warn!(
                "Excluding record {} (image {}) from clustering: {}",
                rejected.record_id, rejected.image_id, error
            );
        }
        debug!(
            "{} record(s) in {} bucket(s), largest {}, at most {} comparison(s)",
            bucketing.record_count(),
            bucketing.buckets.len(),
            bucketing.largest(),
            bucketing.comparison_bound()
        );

        let clusters = self.builder.build_all(&bucketing.buckets, ids);
        ClusterPlan {
            bucketing,
            clusters,
        }
    }

    /// Cluster every unclustered perceptual record and persist the result.
    ///
    /// Cluster ids continue after the highest id already in the store, and
    /// records that already carry an id are never fetched, so earlier
    /// assignments are left alone. A retryable batch failure is retried
    /// from the failed batch up to `retry_attempts` times; any other failure
    /// surfaces as [`BatchWriteError`] with the pairs still pending.
    pub fn run<S: HashStore + ?Sized>(&self, store: &S) -> Result<ClusterReport> {
        let start = Instant::now();
        let records = store.fetch_unclustered(HashMethod::Perceptual)?;
        let mut report = ClusterReport {
            records_fetched: records.len(),
            ..Default::default()
        };

        if records.is_empty() {
            info!("No unclustered records to process");
            return Ok(report);
        }

        let mut ids = ClusterIdAllocator::after(store.max_cluster_id()?);
        let first_id = ids.peek();
        let plan = self.plan(records, &mut ids);

        report.buckets = plan.bucketing.buckets.len();
        report.clusters_formed = plan.clusters.len();
        report.multi_member_clusters = plan.clusters.iter().filter(|c| c.len() > 1).count();
        report.rejected = plan.rejected();
        if !plan.clusters.is_empty() {
            report.cluster_id_range = Some((first_id, ids.peek() - 1));
        }

        let (stats, retries) = self.write_assignments(store, &plan.assignments())?;
        report.records_updated = stats.committed;
        report.retries = retries;

        info!(
            "Clustered {} record(s) into {} cluster(s) ({} with duplicates) in {:?}",
            report.records_fetched - report.rejected.len(),
            report.clusters_formed,
            report.multi_member_clusters,
            start.elapsed()
        );
        Ok(report)
    }

    fn write_assignments<S: HashStore + ?Sized>(
        &self,
        store: &S,
        assignments: &[ClusterAssignment],
    ) -> std::result::Result<(FlushStats, u32), BatchWriteError> {
        let mut writer = BatchWriter::new(store, self.batch_size);
        let mut retries = 0u32;

        for (i, assignment) in assignments.iter().enumerate() {
            let pushed = writer.push(*assignment);
            if let Err(mut e) = self.retry_pending(&mut writer, pushed, &mut retries) {
                e.remaining.extend_from_slice(&assignments[i + 1..]);
                return Err(e);
            }
        }
        let committed = writer.commit_pending();
        self.retry_pending(&mut writer, committed, &mut retries)?;

        Ok((writer.stats(), retries))
    }

    /// Re-commit the writer's failed batch while the failure is retryable
    /// and attempts remain. `retries` counts across the whole pass.
    fn retry_pending<S: HashStore + ?Sized>(
        &self,
        writer: &mut BatchWriter<'_, S>,
        mut result: std::result::Result<(), BatchWriteError>,
        retries: &mut u32,
    ) -> std::result::Result<(), BatchWriteError> {
        while let Err(e) = result {
            if *retries >= self.retry_attempts || !is_retryable(&e.source) {
                return Err(e);
            }
            let delay = backoff_duration(*retries, self.retry_delay_ms);
            warn!(
                "Batch write failed ({}), {} pair(s) in the batch, retrying in {:?}",
                e.source,
                e.remaining.len(),
                delay
            );
            std::thread::sleep(delay);
            *retries += 1;
            result = writer.commit_pending();
        }
        Ok(())
    }
}
