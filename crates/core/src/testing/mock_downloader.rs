//! Mock downloader for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::downloader::{FetchError, FetchedTrailer, StagingArea, TrailerDownloader};
use crate::store::{QualityMetrics, TrailerCandidate};

/// Configured behavior for one URL.
#[derive(Debug, Clone)]
pub enum MockFetch {
    /// Write a small staging file and report the given metrics.
    Success { metrics: QualityMetrics },
    /// Fail with a network error.
    Network(String),
    /// Fail with an HTTP status.
    Http(u16),
    /// Fail with a content error.
    Content(String),
}

/// Mock implementation of the TrailerDownloader trait.
///
/// Behavior is keyed by candidate URL; unconfigured URLs succeed with
/// default 720p metrics. Successful fetches write a real staging file so
/// downstream placement works against the file system.
pub struct MockDownloader {
    behavior: Arc<RwLock<HashMap<String, MockFetch>>>,
    fetch_calls: Arc<RwLock<Vec<String>>>,
}

impl Default for MockDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDownloader {
    pub fn new() -> Self {
        Self {
            behavior: Arc::new(RwLock::new(HashMap::new())),
            fetch_calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Configure the behavior for a URL.
    pub async fn set_behavior(&self, url: &str, fetch: MockFetch) {
        self.behavior.write().await.insert(url.to_string(), fetch);
    }

    /// Configure a successful fetch with specific metrics.
    pub async fn set_success(&self, url: &str, metrics: QualityMetrics) {
        self.set_behavior(url, MockFetch::Success { metrics }).await;
    }

    /// URLs fetched so far, in order.
    pub async fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.read().await.clone()
    }

    /// Number of fetches made for a URL.
    pub async fn fetch_count(&self, url: &str) -> usize {
        self.fetch_calls
            .read()
            .await
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

fn default_metrics() -> QualityMetrics {
    QualityMetrics {
        width: 1280,
        height: 720,
        duration_secs: 90,
        size_bytes: 10_000_000,
    }
}

#[async_trait]
impl TrailerDownloader for MockDownloader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(
        &self,
        candidate: &TrailerCandidate,
        staging: &StagingArea,
    ) -> Result<FetchedTrailer, FetchError> {
        self.fetch_calls.write().await.push(candidate.url.clone());

        let fetch = self
            .behavior
            .read()
            .await
            .get(&candidate.url)
            .cloned()
            .unwrap_or(MockFetch::Success {
                metrics: default_metrics(),
            });

        match fetch {
            MockFetch::Success { metrics } => {
                staging
                    .ensure_movie_dir(candidate.movie_id)
                    .await
                    .map_err(|e| FetchError::Network(e.to_string()))?;
                let path = staging.candidate_path(candidate.movie_id, &candidate.id, "mp4");
                tokio::fs::write(&path, format!("mock trailer for {}", candidate.url))
                    .await
                    .map_err(|e| FetchError::Network(e.to_string()))?;
                Ok(FetchedTrailer {
                    staging_path: path,
                    metrics,
                })
            }
            MockFetch::Network(msg) => Err(FetchError::Network(msg)),
            MockFetch::Http(status) => Err(FetchError::Http { status }),
            MockFetch::Content(msg) => Err(FetchError::Content(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_success_writes_staging_file() {
        let temp = TempDir::new().unwrap();
        let staging = StagingArea::create(temp.path().join("staging")).await.unwrap();
        let downloader = MockDownloader::new();

        let candidate = fixtures::new_candidate(1, "https://a");
        let fetched = downloader.fetch(&candidate, &staging).await.unwrap();

        assert!(fetched.staging_path.exists());
        assert_eq!(fetched.metrics, default_metrics());
        assert_eq!(downloader.fetch_count("https://a").await, 1);
    }

    #[tokio::test]
    async fn test_configured_failure() {
        let temp = TempDir::new().unwrap();
        let staging = StagingArea::create(temp.path().join("staging")).await.unwrap();
        let downloader = MockDownloader::new();
        downloader.set_behavior("https://a", MockFetch::Http(404)).await;

        let candidate = fixtures::new_candidate(1, "https://a");
        let result = downloader.fetch(&candidate, &staging).await;
        assert!(matches!(result, Err(FetchError::Http { status: 404 })));
    }
}
