//! Error types for the placement module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during trailer placement.
///
/// Placement failures never mutate candidate statuses and always leave the
/// staging file intact, so every one of these is safe to retry on a later
/// run.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// Staging file not found.
    #[error("staging file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// The movie's library folder does not exist.
    #[error("movie folder missing: {path}")]
    MovieFolderMissing { path: PathBuf },

    /// The candidate has no staging file recorded.
    #[error("candidate {candidate_id} has no staged file")]
    NotStaged { candidate_id: String },

    /// Failed to copy file.
    #[error("failed to copy {source} to {destination}")]
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to move/rename file.
    #[error("failed to move {source} to {destination}")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Post-copy verification found a mismatch.
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Failed to calculate a checksum.
    #[error("failed to calculate checksum for {path}")]
    ChecksumCalculationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlacementError {
    /// Creates a copy failed error.
    pub fn copy_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::CopyFailed {
            source,
            destination,
            error,
        }
    }

    /// Creates a move failed error.
    pub fn move_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::MoveFailed {
            source,
            destination,
            error,
        }
    }
}
