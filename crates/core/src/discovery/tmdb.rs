//! TMDB-backed discovery provider.
//!
//! Pulls the videos listed for a movie on TMDB and maps YouTube/Vimeo
//! entries to watchable URLs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Movie;

use super::rate_limiter::ProviderRateLimiter;
use super::{DiscoveredTrailer, DiscoveryError, DiscoveryProvider};

const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const VIMEO_URL: &str = "https://vimeo.com/";

/// TMDB provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds (default: 10).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Outgoing request budget per minute (default: 40).
    #[serde(default = "default_rate_limit")]
    pub rate_limit_rpm: u32,
    /// Whether teasers count as candidates alongside trailers (default: true).
    #[serde(default = "default_true")]
    pub include_teasers: bool,
    /// Only accept videos flagged official (default: false).
    #[serde(default)]
    pub official_only: bool,
}

fn default_timeout() -> u32 {
    10
}

fn default_rate_limit() -> u32 {
    40
}

fn default_true() -> bool {
    true
}

/// TMDB discovery provider.
pub struct TmdbProvider {
    client: Client,
    config: TmdbConfig,
    base_url: String,
    limiter: ProviderRateLimiter,
}

impl TmdbProvider {
    /// Create a new TMDB provider from configuration.
    pub fn new(config: TmdbConfig) -> Result<Self, DiscoveryError> {
        if config.api_key.is_empty() {
            return Err(DiscoveryError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| DiscoveryError::ConnectionFailed(e.to_string()))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.themoviedb.org/3".to_string());
        let limiter = ProviderRateLimiter::new(config.rate_limit_rpm);

        Ok(Self {
            client,
            config,
            base_url,
            limiter,
        })
    }
}

#[async_trait]
impl DiscoveryProvider for TmdbProvider {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn discover(&self, movie: &Movie) -> Result<Vec<DiscoveredTrailer>, DiscoveryError> {
        self.limiter.acquire().await?;

        let url = format!(
            "{}/movie/{}/videos?api_key={}",
            self.base_url.trim_end_matches('/'),
            movie.tmdb_id,
            urlencoding::encode(&self.config.api_key)
        );
        debug!(movie_id = movie.id, tmdb_id = movie.tmdb_id, "Querying TMDB videos");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DiscoveryError::Timeout
                } else if e.is_connect() {
                    DiscoveryError::ConnectionFailed(e.to_string())
                } else {
                    DiscoveryError::ApiError {
                        status: 0,
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status == 401 {
            return Err(DiscoveryError::NotConfigured(
                "Invalid TMDB API key".to_string(),
            ));
        }
        if status == 429 {
            return Err(DiscoveryError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::ApiError {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let videos: TmdbVideosResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::ParseError(e.to_string()))?;

        let trailers: Vec<DiscoveredTrailer> = videos
            .results
            .into_iter()
            .filter_map(|v| map_video(v, self.config.include_teasers, self.config.official_only))
            .collect();

        debug!(
            movie_id = movie.id,
            count = trailers.len(),
            "TMDB discovery finished"
        );

        Ok(trailers)
    }
}

#[derive(Debug, Deserialize)]
struct TmdbVideosResponse {
    #[serde(default)]
    results: Vec<TmdbVideoResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbVideoResult {
    key: String,
    site: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    iso_639_1: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    official: bool,
}

/// Map a TMDB video entry to a discovered trailer, or drop it.
///
/// Only YouTube/Vimeo entries have a watchable URL; only trailers (and
/// optionally teasers) count as candidates.
fn map_video(
    video: TmdbVideoResult,
    include_teasers: bool,
    official_only: bool,
) -> Option<DiscoveredTrailer> {
    let url = match video.site.as_str() {
        "YouTube" => format!("{}{}", YOUTUBE_WATCH_URL, video.key),
        "Vimeo" => format!("{}{}", VIMEO_URL, video.key),
        _ => return None,
    };

    let kind_ok = match video.kind.as_deref() {
        Some("Trailer") => true,
        Some("Teaser") => include_teasers,
        _ => false,
    };
    if !kind_ok {
        return None;
    }
    if official_only && !video.official {
        return None;
    }

    Some(DiscoveredTrailer {
        url,
        name: video.name,
        language: video.iso_639_1,
        kind: video.kind,
        official: video.official,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(site: &str, kind: &str, official: bool) -> TmdbVideoResult {
        TmdbVideoResult {
            key: "dQw4w9WgXcQ".to_string(),
            site: site.to_string(),
            name: Some("Official Trailer".to_string()),
            iso_639_1: Some("en".to_string()),
            kind: Some(kind.to_string()),
            official,
        }
    }

    #[test]
    fn test_map_youtube_trailer() {
        let t = map_video(video("YouTube", "Trailer", true), true, false).unwrap();
        assert_eq!(t.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(t.kind.as_deref(), Some("Trailer"));
        assert!(t.official);
    }

    #[test]
    fn test_map_vimeo_trailer() {
        let t = map_video(video("Vimeo", "Trailer", false), true, false).unwrap();
        assert_eq!(t.url, "https://vimeo.com/dQw4w9WgXcQ");
    }

    #[test]
    fn test_unknown_site_is_dropped() {
        assert!(map_video(video("Dailymotion", "Trailer", true), true, false).is_none());
    }

    #[test]
    fn test_teaser_filtering() {
        assert!(map_video(video("YouTube", "Teaser", true), true, false).is_some());
        assert!(map_video(video("YouTube", "Teaser", true), false, false).is_none());
    }

    #[test]
    fn test_non_trailer_kinds_are_dropped() {
        assert!(map_video(video("YouTube", "Featurette", true), true, false).is_none());
        assert!(map_video(video("YouTube", "Behind the Scenes", true), true, false).is_none());
    }

    #[test]
    fn test_official_only_filter() {
        assert!(map_video(video("YouTube", "Trailer", false), true, true).is_none());
        assert!(map_video(video("YouTube", "Trailer", true), true, true).is_some());
    }

    #[test]
    fn test_parse_videos_response() {
        let json = r#"{
            "id": 603,
            "results": [
                {"key": "abc", "site": "YouTube", "name": "Trailer 1", "iso_639_1": "en", "type": "Trailer", "official": true},
                {"key": "def", "site": "YouTube", "type": "Clip", "official": false}
            ]
        }"#;
        let parsed: TmdbVideosResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].kind.as_deref(), Some("Trailer"));
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = TmdbConfig {
            api_key: String::new(),
            base_url: None,
            timeout_secs: 10,
            rate_limit_rpm: 40,
            include_teasers: true,
            official_only: false,
        };
        assert!(matches!(
            TmdbProvider::new(config),
            Err(DiscoveryError::NotConfigured(_))
        ));
    }
}
