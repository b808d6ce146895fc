//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.dedup.read_block_size == 0 {
            return Err(ConfigError::ValidationError(
                "dedup.read_block_size must be > 0".into(),
            ));
        }
        if self.clustering.bucket_prefix_length == 0 {
            return Err(ConfigError::ValidationError(
                "clustering.bucket_prefix_length must be > 0".into(),
            ));
        }
        if self.clustering.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "clustering.batch_size must be > 0".into(),
            ));
        }
        if self.clustering.hash_hex_length == 0 {
            return Err(ConfigError::ValidationError(
                "clustering.hash_hex_length must be > 0".into(),
            ));
        }
        if self.clustering.bucket_prefix_length > self.clustering.hash_hex_length {
            return Err(ConfigError::ValidationError(format!(
                "clustering.bucket_prefix_length ({}) must not exceed clustering.hash_hex_length ({})",
                self.clustering.bucket_prefix_length, self.clustering.hash_hex_length
            )));
        }
        if self.pipeline.buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.buffer_size must be > 0".into(),
            ));
        }
        if self.perceptual.hash_size == 0 {
            return Err(ConfigError::ValidationError(
                "perceptual.hash_size must be > 0".into(),
            ));
        }
        if self.perceptual.hex_length() != self.clustering.hash_hex_length {
            return Err(ConfigError::ValidationError(format!(
                "clustering.hash_hex_length ({}) does not match perceptual.hash_size {} ({} hex chars)",
                self.clustering.hash_hex_length,
                self.perceptual.hash_size,
                self.perceptual.hex_length()
            )));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}
