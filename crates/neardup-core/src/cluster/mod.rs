//! Near-duplicate clustering over stored perceptual hashes.
//!
//! - **hamming**: Fixed-length hash parsing and bit distance
//! - **bucket**: Prefix bucketing to bound comparisons
//! - **greedy**: Seed-linkage cluster building and id allocation
//! - **writer**: Batched persistence of assignments
//! - **pass**: Orchestrates one clustering run against a store

pub mod bucket;
pub mod greedy;
pub mod hamming;
pub mod pass;
pub mod writer;

pub use bucket::{Bucket, Bucketer, Bucketing, HashedRecord};
pub use greedy::{ClusterIdAllocator, GreedyClusterBuilder};
pub use hamming::{hamming_distance, PerceptualHash};
pub use pass::{ClusterPass, ClusterPlan};
pub use writer::{flush, BatchWriter, FlushStats};
