//! Types for the placement module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Type of checksum used to verify cross-volume copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumType {
    /// SHA-256 checksum.
    Sha256,
    /// MD5 checksum (faster but less secure).
    Md5,
}

/// Result of a successful placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedTrailer {
    /// Candidate that was placed.
    pub candidate_id: String,
    /// Final library path.
    pub final_path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Checksum, present when the copy fallback verified one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// Duration of the placement in milliseconds.
    pub duration_ms: u64,
}
