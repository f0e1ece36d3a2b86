//! Trait definitions for the downloader module.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::store::{QualityMetrics, TrailerCandidate};

use super::error::FetchError;
use super::staging::StagingArea;

/// Result of a successful fetch: the staged file plus probed metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTrailer {
    pub staging_path: PathBuf,
    pub metrics: QualityMetrics,
}

/// Fetches a candidate URL into the staging area.
///
/// Implementations write exactly one file per candidate into the movie's
/// staging directory and never touch the library tree.
#[async_trait]
pub trait TrailerDownloader: Send + Sync {
    /// Returns the name of this downloader implementation.
    fn name(&self) -> &str;

    /// Fetch the candidate's URL into staging and probe the result.
    async fn fetch(
        &self,
        candidate: &TrailerCandidate,
        staging: &StagingArea,
    ) -> Result<FetchedTrailer, FetchError>;
}
