//! Prefix bucketing of perceptual hash records.
//!
//! Records are grouped by the first `prefix_length` hex characters of their
//! stored hash, taken verbatim. Only records in the same bucket are ever
//! compared, which bounds the work to the sum of squared bucket sizes.
//! Near-duplicates whose hashes differ inside the prefix land in different
//! buckets and are never compared.

use std::collections::HashMap;

use crate::config::ClusteringConfig;
use crate::error::HashError;
use crate::types::{HashRecord, RejectedRecord};

use super::hamming::PerceptualHash;

/// A record paired with its parsed hash.
#[derive(Debug, Clone)]
pub struct HashedRecord {
    pub record: HashRecord,
    pub hash: PerceptualHash,
}

/// Records sharing a hash prefix, in input order.
#[derive(Debug, Clone)]
pub struct Bucket {
    pub key: String,
    pub members: Vec<HashedRecord>,
}

impl Bucket {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Result of bucketing one batch of records.
#[derive(Debug, Default)]
pub struct Bucketing {
    /// Buckets in order of first appearance of their key
    pub buckets: Vec<Bucket>,

    /// Records excluded because their hash did not parse
    pub rejected: Vec<(RejectedRecord, HashError)>,
}

impl Bucketing {
    /// Total records placed in buckets.
    pub fn record_count(&self) -> usize {
        self.buckets.iter().map(Bucket::len).sum()
    }

    /// Largest bucket size, zero when empty.
    pub fn largest(&self) -> usize {
        self.buckets.iter().map(Bucket::len).max().unwrap_or(0)
    }

    /// Number of pairwise comparisons an all-pairs scan of each bucket costs.
    pub fn comparison_bound(&self) -> u64 {
        self.buckets
            .iter()
            .map(|b| {
                let n = b.len() as u64;
                n * n.saturating_sub(1) / 2
            })
            .sum()
    }
}

/// Partitions records into buckets by hash prefix.
#[derive(Debug, Clone)]
pub struct Bucketer {
    prefix_length: usize,
    hash_hex_length: usize,
}

impl Bucketer {
    /// `prefix_length` and `hash_hex_length` are in hex characters.
    pub fn new(prefix_length: usize, hash_hex_length: usize) -> Self {
        Self {
            prefix_length,
            hash_hex_length,
        }
    }

    pub fn from_config(config: &ClusteringConfig) -> Self {
        Self::new(config.bucket_prefix_length, config.hash_hex_length)
    }

    /// Place every well-formed record in exactly one bucket.
    ///
    /// Bucket order is the order in which each key is first seen, and
    /// members keep their input order, so identical input yields identical
    /// buckets. Records with a malformed hash are returned in `rejected`.
    pub fn bucket(&self, records: Vec<HashRecord>) -> Bucketing {
        let mut result = Bucketing::default();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in records {
            let hash =
                match PerceptualHash::parse(record.id, &record.hash_value, self.hash_hex_length) {
                    Ok(hash) => hash,
                    Err(e) => {
                        let rejected = RejectedRecord {
                            record_id: record.id,
                            image_id: record.image_id,
                            reason: e.to_string(),
                        };
                        result.rejected.push((rejected, e));
                        continue;
                    }
                };

            // Parsing guarantees ASCII hex, so byte slicing is on char boundaries.
            let end = self.prefix_length.min(record.hash_value.len());
            let key = record.hash_value[..end].to_string();
            let slot = match index.get(&key) {
                Some(&slot) => slot,
                None => {
                    result.buckets.push(Bucket {
                        key: key.clone(),
                        members: Vec::new(),
                    });
                    index.insert(key, result.buckets.len() - 1);
                    result.buckets.len() - 1
                }
            };
            result.buckets[slot]
                .members
                .push(HashedRecord { record, hash });
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HashMethod;

    fn record(id: i64, hash: &str) -> HashRecord {
        HashRecord {
            id,
            image_id: id * 10,
            hash_method: HashMethod::Perceptual,
            hash_value: hash.to_string(),
            cluster_id: None,
        }
    }

    #[test]
    fn test_bucket_key_is_verbatim_prefix() {
        let bucketer = Bucketer::new(2, 4);
        let result = bucketer.bucket(vec![
            record(1, "AAAA"),
            record(2, "AAAB"),
            record(3, "FFFF"),
        ]);

        assert_eq!(result.buckets.len(), 2);
        assert_eq!(result.buckets[0].key, "AA");
        assert_eq!(result.buckets[0].len(), 2);
        assert_eq!(result.buckets[1].key, "FF");
        assert_eq!(result.buckets[1].len(), 1);
    }

    #[test]
    fn test_every_record_in_exactly_one_bucket() {
        let hashes = ["12ab", "12ff", "ab12", "12ab", "0000", "ab00", "ffff"];
        let records: Vec<_> = hashes
            .iter()
            .enumerate()
            .map(|(i, h)| record(i as i64 + 1, h))
            .collect();

        let result = Bucketer::new(2, 4).bucket(records.clone());

        assert_eq!(result.record_count(), records.len());
        for r in &records {
            let holding: Vec<_> = result
                .buckets
                .iter()
                .filter(|b| b.members.iter().any(|m| m.record.id == r.id))
                .collect();
            assert_eq!(holding.len(), 1);
            assert_eq!(holding[0].key.as_str(), &r.hash_value[..2]);
        }
    }

    #[test]
    fn test_no_case_normalization() {
        let result = Bucketer::new(2, 4).bucket(vec![record(1, "abcd"), record(2, "ABCD")]);
        assert_eq!(result.buckets.len(), 2);
    }

    #[test]
    fn test_order_is_first_appearance() {
        let result = Bucketer::new(1, 4).bucket(vec![
            record(1, "f000"),
            record(2, "0000"),
            record(3, "f001"),
            record(4, "0001"),
        ]);
        let keys: Vec<_> = result.buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["f", "0"]);
        let ids: Vec<_> = result.buckets[0].members.iter().map(|m| m.record.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_malformed_records_are_rejected_not_bucketed() {
        let result = Bucketer::new(2, 4).bucket(vec![
            record(1, "AAAA"),
            record(2, "AA"),
            record(3, "AZZZ"),
        ]);

        assert_eq!(result.record_count(), 1);
        let rejected: Vec<_> = result.rejected.iter().map(|(r, _)| r.record_id).collect();
        assert_eq!(rejected, vec![2, 3]);
        assert_eq!(result.rejected[0].0.image_id, 20);
        assert!(matches!(result.rejected[1].1, HashError::Malformed { .. }));
    }

    #[test]
    fn test_prefix_equal_to_hash_length() {
        let result = Bucketer::new(4, 4).bucket(vec![record(1, "AAAA"), record(2, "AAAA")]);
        assert_eq!(result.buckets.len(), 1);
        assert_eq!(result.buckets[0].key, "AAAA");
    }

    #[test]
    fn test_comparison_bound() {
        let result = Bucketer::new(1, 4).bucket(vec![
            record(1, "a000"),
            record(2, "a001"),
            record(3, "a002"),
            record(4, "b000"),
        ]);
        assert_eq!(result.comparison_bound(), 3);
        assert_eq!(result.largest(), 3);
    }
}
