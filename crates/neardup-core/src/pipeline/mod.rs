//! Hashing and dedup pipeline components.
//!
//! This module contains the stages that turn files into hashes:
//! - **discovery**: Find candidate image files under corpus roots
//! - **hash**: Streaming content digests
//! - **perceptual**: Perceptual hashes of decoded images
//! - **dedup**: First-seen-wins exact duplicate index
//! - **dedup_pass**: Enumerator → bounded queue → hasher → index
//! - **ingest**: Record images and their hashes in the store
//! - **channel**: Bounded channels for backpressure

pub mod channel;
pub mod dedup;
pub mod dedup_pass;
pub mod discovery;
pub mod hash;
pub mod ingest;
pub mod perceptual;

// Re-exports for convenient access
pub use dedup::{Classification, DedupIndex};
pub use dedup_pass::DedupPass;
pub use discovery::FileDiscovery;
pub use hash::ContentHasher;
pub use ingest::{IngestOutcome, Ingestor};
pub use perceptual::PerceptualHasher;
