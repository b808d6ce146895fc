//! Perceptual hashing for near-duplicate detection.

use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig};
use std::fmt::Write as _;
use std::path::Path;

use crate::config::PerceptualConfig;
use crate::error::HashError;

/// Computes DCT mean hashes, hex encoded.
///
/// The image_hasher configuration is built once and reused for every image.
pub struct PerceptualHasher {
    hasher: image_hasher::Hasher,
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new(&PerceptualConfig::default())
    }
}

impl PerceptualHasher {
    pub fn new(config: &PerceptualConfig) -> Self {
        let hasher = HasherConfig::new()
            .hash_alg(HashAlg::Mean)
            .hash_size(config.hash_size, config.hash_size)
            .preproc_dct()
            .to_hasher();
        Self { hasher }
    }

    /// Hash a decoded image.
    ///
    /// Similar images produce hashes with a small Hamming distance.
    pub fn hash_image(&self, image: &DynamicImage) -> String {
        let hash = self.hasher.hash_image(image);
        to_hex(hash.as_bytes())
    }

    /// Decode an image file and hash it.
    pub fn hash_file(&self, path: &Path) -> Result<String, HashError> {
        let image = image::open(path).map_err(|e| HashError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(self.hash_image(&image))
    }
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
