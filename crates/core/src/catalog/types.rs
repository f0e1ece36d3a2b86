//! Types for the movie catalog collaborator.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A movie as the library manager knows it.
///
/// The catalog owns this data; the core only caches what it needs to build
/// paths and query discovery providers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    /// Stable catalog id.
    pub id: i64,
    /// TMDB id, used by discovery providers.
    pub tmdb_id: i64,
    /// Movie title.
    pub title: String,
    /// Release year.
    pub year: u32,
    /// Library folder holding the movie's files.
    pub folder: PathBuf,
    /// Path of the primary video file, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_file: Option<PathBuf>,
    /// Whether the catalog reports a primary file on disk.
    pub has_file: bool,
}

impl Movie {
    /// File stem of the primary video file, used to derive the trailer name.
    pub fn file_stem(&self) -> Option<String> {
        self.movie_file
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().to_string())
    }
}

impl std::fmt::Display for Movie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.title, self.year)
    }
}

/// Push notification from the catalog about a movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum CatalogEvent {
    /// A release was grabbed for the movie.
    Grab { movie_id: i64 },
    /// The movie finished downloading or was upgraded in place.
    Download { movie_id: i64 },
    /// The movie's files were renamed.
    Rename { movie_id: i64 },
    /// The movie's file was deleted; `reason` distinguishes upgrades from
    /// real removals.
    MovieFileDelete { movie_id: i64, reason: String },
    /// Connectivity test fired when the webhook is configured.
    Test,
}

/// Errors from the catalog collaborator.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog connection failed: {0}")]
    ConnectionFailed(String),

    #[error("catalog API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("catalog request timed out")]
    Timeout,

    #[error("failed to parse catalog response: {0}")]
    ParseError(String),

    #[error("catalog not configured: {0}")]
    NotConfigured(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        let movie = Movie {
            id: 1,
            tmdb_id: 603,
            title: "The Matrix".to_string(),
            year: 1999,
            folder: PathBuf::from("/library/The Matrix (1999)"),
            movie_file: Some(PathBuf::from(
                "/library/The Matrix (1999)/The Matrix (1999) Bluray-1080p.mkv",
            )),
            has_file: true,
        };
        assert_eq!(
            movie.file_stem().as_deref(),
            Some("The Matrix (1999) Bluray-1080p")
        );
        assert_eq!(movie.to_string(), "The Matrix (1999)");
    }

    #[test]
    fn test_event_serialization() {
        let event = CatalogEvent::MovieFileDelete {
            movie_id: 7,
            reason: "upgrade".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"movie_file_delete\""));

        let back: CatalogEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_test_event_round_trip() {
        let json = r#"{"event_type":"test"}"#;
        let event: CatalogEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, CatalogEvent::Test);
    }
}
