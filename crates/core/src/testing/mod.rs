//! Testing utilities and mock implementations.
//!
//! Mock implementations of the pipeline's collaborator traits, allowing
//! end-to-end pipeline tests without network, providers, or a library
//! manager.

mod mock_catalog;
mod mock_downloader;
mod mock_placer;
mod mock_provider;

pub use mock_catalog::MockMovieCatalog;
pub use mock_downloader::{MockDownloader, MockFetch};
pub use mock_placer::MockTrailerPlacer;
pub use mock_provider::MockDiscoveryProvider;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use chrono::Utc;

    use crate::catalog::Movie;
    use crate::discovery::DiscoveredTrailer;
    use crate::store::{CandidateStatus, QualityMetrics, TrailerCandidate, TrailerMeta};

    /// Create a test movie with a primary file in place.
    pub fn movie(id: i64, title: &str, year: u32, folder: &Path) -> Movie {
        Movie {
            id,
            tmdb_id: 100_000 + id,
            title: title.to_string(),
            year,
            folder: folder.to_path_buf(),
            movie_file: Some(folder.join(format!("{} ({}).mkv", title, year))),
            has_file: true,
        }
    }

    /// Create a test movie without a primary file.
    pub fn movie_without_file(id: i64, title: &str, year: u32, folder: &Path) -> Movie {
        Movie {
            movie_file: None,
            has_file: false,
            ..movie(id, title, year, folder)
        }
    }

    /// Create a discovered trailer with reasonable metadata.
    pub fn discovered(url: &str) -> DiscoveredTrailer {
        DiscoveredTrailer {
            url: url.to_string(),
            name: Some("Official Trailer".to_string()),
            language: Some("en".to_string()),
            kind: Some("Trailer".to_string()),
            official: true,
        }
    }

    /// Quality metrics helper.
    pub fn metrics(width: u32, height: u32, duration_secs: u32, size_bytes: u64) -> QualityMetrics {
        QualityMetrics {
            width,
            height,
            duration_secs,
            size_bytes,
        }
    }

    /// A New candidate, as if freshly discovered.
    pub fn new_candidate(movie_id: i64, url: &str) -> TrailerCandidate {
        TrailerCandidate {
            id: format!("cand-{}", url.trim_start_matches("https://")),
            movie_id,
            url: url.to_string(),
            meta: TrailerMeta::default(),
            status: CandidateStatus::New,
            discovered_at: Utc::now(),
            attempts: 0,
            last_attempt_at: None,
            failure_reason: None,
            staging_path: None,
            final_path: None,
            metrics: None,
        }
    }
}
