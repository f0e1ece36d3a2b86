//! Mock placer for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::Movie;
use crate::placer::{PlacedTrailer, PlacementError, TrailerPlacer};
use crate::store::TrailerCandidate;

/// Mock implementation of the TrailerPlacer trait.
///
/// Computes a plausible final path without touching the file system,
/// records placements, and supports a permanently-failing mode for
/// exercising placement retry behavior.
pub struct MockTrailerPlacer {
    placements: Arc<RwLock<Vec<(i64, String, PathBuf)>>>,
    fail_always: Arc<RwLock<bool>>,
}

impl Default for MockTrailerPlacer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTrailerPlacer {
    pub fn new() -> Self {
        Self {
            placements: Arc::new(RwLock::new(Vec::new())),
            fail_always: Arc::new(RwLock::new(false)),
        }
    }

    /// Make every placement fail.
    pub async fn set_fail_always(&self, fail: bool) {
        *self.fail_always.write().await = fail;
    }

    /// Recorded placements as (movie_id, candidate_id, final_path).
    pub async fn placements(&self) -> Vec<(i64, String, PathBuf)> {
        self.placements.read().await.clone()
    }
}

#[async_trait]
impl TrailerPlacer for MockTrailerPlacer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn place(
        &self,
        movie: &Movie,
        candidate: &TrailerCandidate,
    ) -> Result<PlacedTrailer, PlacementError> {
        if *self.fail_always.read().await {
            return Err(PlacementError::MovieFolderMissing {
                path: movie.folder.clone(),
            });
        }

        let stem = movie
            .file_stem()
            .unwrap_or_else(|| format!("{} ({})", movie.title, movie.year));
        let final_path = movie.folder.join(format!("{}-trailer.mp4", stem));

        self.placements
            .write()
            .await
            .push((movie.id, candidate.id.clone(), final_path.clone()));

        Ok(PlacedTrailer {
            candidate_id: candidate.id.clone(),
            final_path,
            size_bytes: candidate.metrics.map(|m| m.size_bytes).unwrap_or(0),
            checksum: None,
            duration_ms: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use std::path::Path;

    #[tokio::test]
    async fn test_records_placements() {
        let placer = MockTrailerPlacer::new();
        let movie = fixtures::movie(1, "A", 2020, Path::new("/lib/a"));
        let candidate = fixtures::new_candidate(1, "https://a");

        let placed = placer.place(&movie, &candidate).await.unwrap();
        assert_eq!(placed.final_path, Path::new("/lib/a/A (2020)-trailer.mp4"));
        assert_eq!(placer.placements().await.len(), 1);
    }

    #[tokio::test]
    async fn test_fail_always() {
        let placer = MockTrailerPlacer::new();
        placer.set_fail_always(true).await;

        let movie = fixtures::movie(1, "A", 2020, Path::new("/lib/a"));
        let candidate = fixtures::new_candidate(1, "https://a");
        assert!(placer.place(&movie, &candidate).await.is_err());
        assert!(placer.placements().await.is_empty());
    }
}
