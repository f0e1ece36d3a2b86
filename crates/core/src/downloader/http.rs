//! HTTP downloader implementation.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::store::{QualityMetrics, TrailerCandidate};

use super::config::DownloaderConfig;
use super::error::FetchError;
use super::probe::MediaProbe;
use super::staging::StagingArea;
use super::traits::{FetchedTrailer, TrailerDownloader};

/// Downloads trailer candidates over plain HTTP.
pub struct HttpDownloader {
    client: Client,
    probe: Arc<dyn MediaProbe>,
}

impl HttpDownloader {
    /// Create a new HTTP downloader.
    pub fn new(config: &DownloaderConfig, probe: Arc<dyn MediaProbe>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client, probe })
    }

    /// Stream the response body into the staging file.
    ///
    /// Returns the byte count; on any error the partial file is removed so
    /// staging never holds a torn download.
    async fn stream_to_file(
        &self,
        response: reqwest::Response,
        path: &Path,
    ) -> Result<u64, FetchError> {
        let mut file = File::create(path)
            .await
            .map_err(|e| FetchError::Network(format!("staging write: {}", e)))?;

        let mut stream = response.bytes_stream();
        let mut total: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    let _ = fs::remove_file(path).await;
                    let msg = if e.is_timeout() {
                        "transfer timed out".to_string()
                    } else {
                        e.to_string()
                    };
                    return Err(FetchError::Network(msg));
                }
            };
            if let Err(e) = file.write_all(&chunk).await {
                let _ = fs::remove_file(path).await;
                return Err(FetchError::Network(format!("staging write: {}", e)));
            }
            total += chunk.len() as u64;
        }

        if let Err(e) = file.flush().await {
            let _ = fs::remove_file(path).await;
            return Err(FetchError::Network(format!("staging write: {}", e)));
        }

        Ok(total)
    }
}

#[async_trait]
impl TrailerDownloader for HttpDownloader {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(
        &self,
        candidate: &TrailerCandidate,
        staging: &StagingArea,
    ) -> Result<FetchedTrailer, FetchError> {
        debug!(
            candidate_id = %candidate.id,
            url = %candidate.url,
            "Fetching trailer candidate"
        );

        staging
            .ensure_movie_dir(candidate.movie_id)
            .await
            .map_err(|e| FetchError::Network(format!("staging dir: {}", e)))?;

        let response = self.client.get(&candidate.url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Network("request timed out".to_string())
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(ref ct) = content_type {
            if !is_video_content_type(ct) {
                return Err(FetchError::Content(format!("content-type {}", ct)));
            }
        }

        let extension = extension_for(content_type.as_deref(), &candidate.url);
        let path = staging.candidate_path(candidate.movie_id, &candidate.id, extension);

        let bytes = self.stream_to_file(response, &path).await?;
        if bytes == 0 {
            let _ = fs::remove_file(&path).await;
            return Err(FetchError::Content("empty body".to_string()));
        }

        let probed = match self.probe.probe(&path).await {
            Ok(p) => p,
            Err(e) => {
                warn!(candidate_id = %candidate.id, error = %e, "Probe rejected download");
                let _ = fs::remove_file(&path).await;
                return Err(FetchError::Content(format!("probe failed: {}", e)));
            }
        };

        let size_bytes = fs::metadata(&path)
            .await
            .map(|m| m.len())
            .unwrap_or(bytes);

        Ok(FetchedTrailer {
            staging_path: path,
            metrics: QualityMetrics {
                width: probed.width,
                height: probed.height,
                duration_secs: probed.duration_secs,
                size_bytes,
            },
        })
    }
}

/// Whether a content type can plausibly carry a video payload.
///
/// Generic binary types are allowed through; the probe is the real gate.
fn is_video_content_type(content_type: &str) -> bool {
    let ct = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    ct.starts_with("video/")
        || ct == "application/octet-stream"
        || ct == "application/mp4"
        || ct == "binary/octet-stream"
}

/// File extension for the staged download.
fn extension_for(content_type: Option<&str>, url: &str) -> &'static str {
    match content_type.map(|ct| ct.split(';').next().unwrap_or(ct).trim()) {
        Some("video/mp4") | Some("application/mp4") => return "mp4",
        Some("video/webm") => return "webm",
        Some("video/x-matroska") => return "mkv",
        Some("video/quicktime") => return "mov",
        _ => {}
    }

    // Fall back to the URL path's extension for the common containers.
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit('.').next() {
        Some("webm") => "webm",
        Some("mkv") => "mkv",
        Some("mov") => "mov",
        _ => "mp4",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_content_types() {
        assert!(is_video_content_type("video/mp4"));
        assert!(is_video_content_type("video/webm; charset=binary"));
        assert!(is_video_content_type("application/octet-stream"));
        assert!(!is_video_content_type("text/html"));
        assert!(!is_video_content_type("application/json"));
        assert!(!is_video_content_type("image/png"));
    }

    #[test]
    fn test_extension_from_content_type() {
        assert_eq!(extension_for(Some("video/mp4"), "https://x/file"), "mp4");
        assert_eq!(extension_for(Some("video/webm"), "https://x/file"), "webm");
        assert_eq!(
            extension_for(Some("video/x-matroska"), "https://x/file"),
            "mkv"
        );
    }

    #[test]
    fn test_extension_from_url() {
        assert_eq!(
            extension_for(Some("application/octet-stream"), "https://x/trailer.webm?sig=1"),
            "webm"
        );
        assert_eq!(extension_for(None, "https://x/trailer.mkv"), "mkv");
        assert_eq!(extension_for(None, "https://x/watch?v=abc"), "mp4");
    }
}
