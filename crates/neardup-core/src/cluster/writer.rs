//! Batched persistence of cluster assignments.
//!
//! Assignments are committed to the store in batches of `batch_size` as
//! they are pushed, each batch in its own transaction. A failed commit
//! reports how many pairs were already committed along with everything
//! still pending, so the caller can retry from there.

use tracing::debug;

use crate::error::BatchWriteError;
use crate::store::HashStore;
use crate::types::ClusterAssignment;

/// Counters from a successful flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Batches committed
    pub batches: usize,

    /// Pairs committed
    pub committed: u64,

    /// Records whose cluster id was newly set (less than `committed` when a
    /// batch is re-applied after a retry)
    pub changed: u64,
}

/// Commit `pending` in consecutive batches of at most `batch_size` pairs.
///
/// Every batch but possibly the last is exactly `batch_size` long. On the
/// first failed commit, returns the pairs from that batch onward as
/// `remaining`; earlier batches stay committed.
pub fn flush<S: HashStore + ?Sized>(
    store: &S,
    pending: &[ClusterAssignment],
    batch_size: usize,
) -> Result<FlushStats, BatchWriteError> {
    let mut writer = BatchWriter::new(store, batch_size);
    for (i, assignment) in pending.iter().enumerate() {
        writer.push(*assignment).map_err(|mut e| {
            e.remaining.extend_from_slice(&pending[i + 1..]);
            e
        })?;
    }
    writer.finish()
}

/// Streams assignments to the store, committing each time `batch_size`
/// pairs have been queued.
///
/// When a commit fails the failed batch stays queued and the error carries
/// it as `remaining`. Call [`BatchWriter::commit_pending`] to retry it before
/// pushing more.
pub struct BatchWriter<'a, S: HashStore + ?Sized> {
    store: &'a S,
    batch_size: usize,
    pending: Vec<ClusterAssignment>,
    stats: FlushStats,
}

impl<'a, S: HashStore + ?Sized> BatchWriter<'a, S> {
    /// A zero `batch_size` is clamped to one.
    pub fn new(store: &'a S, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            store,
            batch_size,
            pending: Vec::new(),
            stats: FlushStats::default(),
        }
    }

    /// Queue one pair, committing the batch if it is now full.
    pub fn push(&mut self, assignment: ClusterAssignment) -> Result<(), BatchWriteError> {
        self.pending.push(assignment);
        if self.pending.len() >= self.batch_size {
            self.commit_pending()?;
        }
        Ok(())
    }

    /// Commit whatever is queued, full batch or not.
    pub fn commit_pending(&mut self) -> Result<(), BatchWriteError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        match self.store.apply_cluster_assignments(&self.pending) {
            Ok(changed) => {
                self.stats.batches += 1;
                self.stats.committed += self.pending.len() as u64;
                self.stats.changed += changed as u64;
                debug!(
                    "Committed batch {} ({} pair(s), {} total)",
                    self.stats.batches,
                    self.pending.len(),
                    self.stats.committed
                );
                self.pending.clear();
                Ok(())
            }
            Err(source) => Err(BatchWriteError {
                committed: self.stats.committed,
                remaining: self.pending.clone(),
                source,
            }),
        }
    }

    /// Counters for the batches committed so far.
    pub fn stats(&self) -> FlushStats {
        self.stats
    }

    /// Commit the final partial batch.
    pub fn finish(mut self) -> Result<FlushStats, BatchWriteError> {
        self.commit_pending()?;
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use crate::types::{HashMethod, HashRecord};
    use std::cell::{Cell, RefCell};

    /// Store fake that records committed batches and can fail the Nth commit.
    #[derive(Default)]
    struct RecordingStore {
        batches: RefCell<Vec<Vec<ClusterAssignment>>>,
        calls: Cell<usize>,
        fail_on_call: Option<usize>,
    }

    impl RecordingStore {
        fn failing_on(call: usize) -> Self {
            Self {
                fail_on_call: Some(call),
                ..Default::default()
            }
        }
    }

    impl HashStore for RecordingStore {
        fn fetch_unclustered(&self, _method: HashMethod) -> StoreResult<Vec<HashRecord>> {
            Ok(Vec::new())
        }

        fn apply_cluster_assignments(&self, batch: &[ClusterAssignment]) -> StoreResult<usize> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            if self.fail_on_call == Some(call) {
                return Err(StoreError::Write(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
                    None,
                )));
            }
            self.batches.borrow_mut().push(batch.to_vec());
            Ok(batch.len())
        }

        fn max_cluster_id(&self) -> StoreResult<Option<i64>> {
            Ok(None)
        }
    }

    fn pairs(n: i64) -> Vec<ClusterAssignment> {
        (1..=n)
            .map(|i| ClusterAssignment {
                cluster_id: 1,
                record_id: i,
            })
            .collect()
    }

    #[test]
    fn test_batches_split_at_batch_size() {
        let store = RecordingStore::default();
        let stats = flush(&store, &pairs(5), 2).unwrap();

        let sizes: Vec<_> = store.batches.borrow().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(stats.batches, 3);
        assert_eq!(stats.committed, 5);
        assert_eq!(stats.changed, 5);
    }

    #[test]
    fn test_failed_third_batch_reports_progress() {
        let store = RecordingStore::failing_on(3);
        let all = pairs(5);
        let err = flush(&store, &all, 2).unwrap_err();

        assert_eq!(err.committed, 4);
        assert_eq!(err.remaining, all[4..].to_vec());
        assert!(matches!(err.source, StoreError::Write(_)));
        assert_eq!(store.batches.borrow().len(), 2);
    }

    #[test]
    fn test_failed_first_batch_leaves_everything_pending() {
        let store = RecordingStore::failing_on(1);
        let all = pairs(3);
        let err = flush(&store, &all, 10).unwrap_err();
        assert_eq!(err.committed, 0);
        assert_eq!(err.remaining, all);
    }

    #[test]
    fn test_empty_flush_commits_nothing() {
        let store = RecordingStore::default();
        let stats = flush(&store, &[], 100).unwrap();
        assert_eq!(stats, FlushStats::default());
        assert_eq!(store.calls.get(), 0);
    }

    #[test]
    fn test_writer_commits_full_batches_while_pushing() {
        let store = RecordingStore::default();
        let mut writer = BatchWriter::new(&store, 2);
        for pair in pairs(5) {
            writer.push(pair).unwrap();
        }

        assert_eq!(writer.stats().committed, 4);
        assert_eq!(writer.stats().batches, 2);
        assert_eq!(store.batches.borrow().len(), 2);

        let stats = writer.finish().unwrap();
        assert_eq!(stats.committed, 5);
        assert_eq!(store.batches.borrow()[2], pairs(5)[4..].to_vec());
    }

    #[test]
    fn test_writer_keeps_failed_batch_for_retry() {
        let store = RecordingStore::failing_on(2);
        let all = pairs(4);
        let mut writer = BatchWriter::new(&store, 2);
        writer.push(all[0]).unwrap();
        writer.push(all[1]).unwrap();
        writer.push(all[2]).unwrap();

        let err = writer.push(all[3]).unwrap_err();
        assert_eq!(err.committed, 2);
        assert_eq!(err.remaining, all[2..].to_vec());

        writer.commit_pending().unwrap();
        let stats = writer.finish().unwrap();
        assert_eq!(stats.committed, 4);
        assert_eq!(stats.batches, 2);
        assert_eq!(store.batches.borrow()[1], all[2..].to_vec());
    }
}
