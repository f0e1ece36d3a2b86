//! Configuration for the placement module.

use serde::{Deserialize, Serialize};

use super::types::ChecksumType;

/// Configuration for the file system placer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacerConfig {
    /// Buffer size for file copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Whether to attempt an atomic rename before falling back to copy.
    #[serde(default = "default_true")]
    pub prefer_atomic_moves: bool,

    /// Checksum used to verify cross-volume copies.
    #[serde(default = "default_checksum")]
    pub verify_checksum: ChecksumType,

    /// Trailer filename template, without extension.
    ///
    /// Tokens: `{stem}` (movie file stem), `{title}`, `{year}`.
    #[serde(default = "default_filename")]
    pub trailer_filename: String,
}

fn default_buffer_size() -> usize {
    8 * 1024 * 1024 // 8 MB
}

fn default_true() -> bool {
    true
}

fn default_checksum() -> ChecksumType {
    ChecksumType::Sha256
}

fn default_filename() -> String {
    "{stem}-trailer".to_string()
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            prefer_atomic_moves: true,
            verify_checksum: default_checksum(),
            trailer_filename: default_filename(),
        }
    }
}

impl PlacerConfig {
    /// Creates a new config with atomic moves enabled or disabled.
    pub fn with_atomic_moves(mut self, enabled: bool) -> Self {
        self.prefer_atomic_moves = enabled;
        self
    }

    /// Sets the checksum type for copy verification.
    pub fn with_checksum(mut self, checksum: ChecksumType) -> Self {
        self.verify_checksum = checksum;
        self
    }

    /// Sets the trailer filename template.
    pub fn with_filename(mut self, template: impl Into<String>) -> Self {
        self.trailer_filename = template.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlacerConfig::default();
        assert_eq!(config.buffer_size, 8 * 1024 * 1024);
        assert!(config.prefer_atomic_moves);
        assert_eq!(config.verify_checksum, ChecksumType::Sha256);
        assert_eq!(config.trailer_filename, "{stem}-trailer");
    }

    #[test]
    fn test_config_builder() {
        let config = PlacerConfig::default()
            .with_atomic_moves(false)
            .with_checksum(ChecksumType::Md5)
            .with_filename("{title} ({year})-trailer");

        assert!(!config.prefer_atomic_moves);
        assert_eq!(config.verify_checksum, ChecksumType::Md5);
        assert_eq!(config.trailer_filename, "{title} ({year})-trailer");
    }
}
