//! Greedy seed-linkage clustering within a bucket.
//!
//! For each bucket, in order: the first unvisited candidate seeds a cluster,
//! and every later unvisited candidate within `distance_threshold` bits of
//! that seed joins it. Candidates are compared to the seed only, never to
//! other members, so a candidate close to a non-seed member but far from the
//! seed starts or joins a different cluster. Every emitted cluster, singletons
//! included, takes the next id from a counter shared by all buckets.

use std::collections::HashSet;

use crate::types::{Cluster, ClusterMember};

use super::bucket::Bucket;

/// Issues strictly increasing cluster ids.
#[derive(Debug, Clone)]
pub struct ClusterIdAllocator {
    next: i64,
}

impl ClusterIdAllocator {
    /// Start issuing at `first`.
    pub fn starting_at(first: i64) -> Self {
        Self { next: first }
    }

    /// Start after the highest id already in use, or at 1.
    pub fn after(max_existing: Option<i64>) -> Self {
        Self::starting_at(max_existing.map_or(1, |max| max + 1))
    }

    /// Take the next id.
    pub fn next_id(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next call to `next_id` returns.
    pub fn peek(&self) -> i64 {
        self.next
    }
}

/// Builds clusters from buckets using seed-only linkage.
#[derive(Debug, Clone, Copy)]
pub struct GreedyClusterBuilder {
    distance_threshold: u32,
}

impl GreedyClusterBuilder {
    pub fn new(distance_threshold: u32) -> Self {
        Self { distance_threshold }
    }

    /// Cluster one bucket, drawing ids from `ids`.
    pub fn build(&self, bucket: &Bucket, ids: &mut ClusterIdAllocator) -> Vec<Cluster> {
        let mut visited: HashSet<i64> = HashSet::new();
        let mut clusters = Vec::new();

        for (i, seed) in bucket.members.iter().enumerate() {
            if !visited.insert(seed.record.image_id) {
                continue;
            }

            let mut members = vec![ClusterMember {
                record_id: seed.record.id,
                image_id: seed.record.image_id,
            }];

            for other in &bucket.members[i + 1..] {
                if visited.contains(&other.record.image_id) {
                    continue;
                }
                if seed.hash.distance(&other.hash) <= self.distance_threshold {
                    visited.insert(other.record.image_id);
                    members.push(ClusterMember {
                        record_id: other.record.id,
                        image_id: other.record.image_id,
                    });
                }
            }

            clusters.push(Cluster {
                id: ids.next_id(),
                members,
            });
        }

        clusters
    }

    /// Cluster every bucket in order with one shared id counter.
    pub fn build_all(&self, buckets: &[Bucket], ids: &mut ClusterIdAllocator) -> Vec<Cluster> {
        let mut clusters = Vec::new();
        for bucket in buckets {
            let built = self.build(bucket, ids);
            tracing::trace!(
                "Bucket {:?}: {} member(s) -> {} cluster(s)",
                bucket.key,
                bucket.len(),
                built.len()
            );
            clusters.extend(built);
        }
        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::bucket::Bucketer;
    use crate::cluster::hamming::hamming_distance;
    use crate::types::{HashMethod, HashRecord};

    fn record(id: i64, hash: &str) -> HashRecord {
        HashRecord {
            id,
            image_id: 100 + id,
            hash_method: HashMethod::Perceptual,
            hash_value: hash.to_string(),
            cluster_id: None,
        }
    }

    fn cluster_records(
        records: Vec<HashRecord>,
        prefix: usize,
        hex_len: usize,
        threshold: u32,
    ) -> Vec<Cluster> {
        let bucketing = Bucketer::new(prefix, hex_len).bucket(records);
        let mut ids = ClusterIdAllocator::starting_at(1);
        GreedyClusterBuilder::new(threshold).build_all(&bucketing.buckets, &mut ids)
    }

    #[test]
    fn test_two_buckets_scenario() {
        let clusters = cluster_records(
            vec![record(1, "AAAA"), record(2, "AAAB"), record(3, "FFFF")],
            2,
            4,
            1,
        );

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].id, 1);
        assert_eq!(clusters[0].image_ids(), vec![101, 102]);
        assert_eq!(clusters[1].id, 2);
        assert_eq!(clusters[1].image_ids(), vec![103]);
    }

    #[test]
    fn test_seed_only_linkage_is_not_transitive() {
        // 0000 -> 0001 is 1 bit, 0001 -> 0003 is 1 bit, 0000 -> 0003 is 2 bits.
        let clusters = cluster_records(
            vec![record(1, "0000"), record(2, "0001"), record(3, "0003")],
            1,
            4,
            1,
        );

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].image_ids(), vec![101, 102]);
        assert_eq!(clusters[1].image_ids(), vec![103]);
    }

    #[test]
    fn test_members_within_threshold_of_seed() {
        let hashes = [
            "a000", "a001", "a003", "a007", "a00f", "a0ff", "a100", "a300", "a0f0", "a011",
        ];
        let records: Vec<_> = hashes
            .iter()
            .enumerate()
            .map(|(i, h)| record(i as i64 + 1, h))
            .collect();
        let by_id: std::collections::HashMap<i64, String> = records
            .iter()
            .map(|r| (r.id, r.hash_value.clone()))
            .collect();

        for threshold in 0..=4 {
            let clusters = cluster_records(records.clone(), 1, 4, threshold);
            for cluster in &clusters {
                let seed = &by_id[&cluster.members[0].record_id];
                for member in &cluster.members {
                    let d = hamming_distance(seed, &by_id[&member.record_id]).unwrap();
                    assert!(d <= threshold);
                }
            }
            let total: usize = clusters.iter().map(Cluster::len).sum();
            assert_eq!(total, records.len());
        }
    }

    #[test]
    fn test_ids_strictly_increase_across_buckets() {
        let clusters = cluster_records(
            vec![
                record(1, "1000"),
                record(2, "2000"),
                record(3, "1fff"),
                record(4, "3000"),
            ],
            1,
            4,
            0,
        );
        let ids: Vec<_> = clusters.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_no_cross_bucket_matches() {
        // 0fff and 1fff differ by one bit but sit in different buckets.
        let clusters = cluster_records(vec![record(1, "0fff"), record(2, "1fff")], 1, 4, 4);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn test_zero_threshold_groups_exact_hashes() {
        let clusters = cluster_records(
            vec![record(1, "abcd"), record(2, "abce"), record(3, "abcd")],
            2,
            4,
            0,
        );
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].image_ids(), vec![101, 103]);
    }

    #[test]
    fn test_same_input_same_clusters() {
        let records = vec![
            record(1, "aa00"),
            record(2, "aa01"),
            record(3, "bb00"),
            record(4, "aa03"),
        ];
        let a = cluster_records(records.clone(), 2, 4, 1);
        let b = cluster_records(records, 2, 4, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_allocator_continues_after_existing() {
        let mut ids = ClusterIdAllocator::after(Some(41));
        assert_eq!(ids.next_id(), 42);
        assert_eq!(ids.peek(), 43);
        assert_eq!(ClusterIdAllocator::after(None).peek(), 1);
    }

    #[test]
    fn test_repeated_image_id_joins_once() {
        let mut second = record(2, "aaaa");
        second.image_id = 101;
        let clusters = cluster_records(vec![record(1, "aaaa"), second], 2, 4, 0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 1);
    }
}
