//! Types for the trailer discovery system.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A trailer URL yielded by a discovery provider, with whatever metadata
/// the provider knows about it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscoveredTrailer {
    /// Watchable URL for the trailer.
    pub url: String,
    /// Human-readable name (e.g. "Official Trailer #2").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// ISO 639-1 language code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Provider-reported kind (e.g. "Trailer", "Teaser").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Whether the provider flags this as an official upload.
    #[serde(default)]
    pub official: bool,
}

impl DiscoveredTrailer {
    /// Create a bare discovery result with just a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            language: None,
            kind: None,
            official: false,
        }
    }
}

/// Errors that can occur during discovery.
///
/// All of these are non-fatal for a pipeline run: the movie is skipped and
/// retried on the next run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("provider connection failed: {0}")]
    ConnectionFailed(String),

    #[error("provider API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("provider rate limit exceeded")]
    RateLimited,

    #[error("provider request timed out")]
    Timeout,

    #[error("failed to parse provider response: {0}")]
    ParseError(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovered_trailer_defaults() {
        let t = DiscoveredTrailer::new("https://www.youtube.com/watch?v=abc");
        assert!(t.name.is_none());
        assert!(!t.official);
    }

    #[test]
    fn test_discovered_trailer_serialization_skips_empty() {
        let t = DiscoveredTrailer::new("https://x");
        let json = serde_json::to_string(&t).unwrap();
        assert!(!json.contains("name"));
        assert!(json.contains("\"official\":false"));
    }
}
