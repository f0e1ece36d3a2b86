//! Core trailer candidate data types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::discovery::DiscoveredTrailer;

/// Lifecycle status of a trailer candidate.
///
/// ```text
/// New -> Downloading -> Downloaded -> Selected
///              |             |
///              v             v
///           Broken        Rejected
///
/// Broken and Rejected can return to New via an explicit reset.
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    /// Discovered, not yet attempted.
    New,
    /// Claimed by a download worker.
    Downloading,
    /// Fetched into staging with quality metrics.
    Downloaded,
    /// Download or probe failed permanently; never retried automatically.
    Broken,
    /// Chosen and placed into the library.
    Selected,
    /// Downloaded but not chosen; retained for audit and manual override.
    Rejected,
}

impl CandidateStatus {
    /// Returns the status as a string (for storage and filtering).
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::New => "new",
            CandidateStatus::Downloading => "downloading",
            CandidateStatus::Downloaded => "downloaded",
            CandidateStatus::Broken => "broken",
            CandidateStatus::Selected => "selected",
            CandidateStatus::Rejected => "rejected",
        }
    }

    /// Parse a status string as stored in the database.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(CandidateStatus::New),
            "downloading" => Some(CandidateStatus::Downloading),
            "downloaded" => Some(CandidateStatus::Downloaded),
            "broken" => Some(CandidateStatus::Broken),
            "selected" => Some(CandidateStatus::Selected),
            "rejected" => Some(CandidateStatus::Rejected),
            _ => None,
        }
    }

    /// Returns true if the candidate can be returned to New via reset.
    pub fn can_reset(&self) -> bool {
        matches!(self, CandidateStatus::Broken | CandidateStatus::Rejected)
    }

    /// Returns true if a download worker may claim this candidate.
    pub fn is_claimable(&self) -> bool {
        matches!(self, CandidateStatus::New)
    }
}

impl std::fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality metrics extracted from a downloaded trailer file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QualityMetrics {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Duration in whole seconds.
    pub duration_secs: u32,
    /// File size in bytes.
    pub size_bytes: u64,
}

impl QualityMetrics {
    /// Resolution as a comparable key: higher is better.
    pub fn resolution(&self) -> (u32, u32) {
        (self.height, self.width)
    }
}

/// Discovery metadata attached to a candidate, as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TrailerMeta {
    /// Human-readable trailer name (e.g. "Official Trailer #2").
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

impl From<&DiscoveredTrailer> for TrailerMeta {
    fn from(d: &DiscoveredTrailer) -> Self {
        Self {
            name: d.name.clone(),
            language: d.language.clone(),
            kind: d.kind.clone(),
            official: d.official,
        }
    }
}

/// A discovered trailer URL tracked through its lifecycle.
///
/// Unique per `(movie_id, url)`. The staging path is present only while a
/// downloaded copy sits in staging; after placement the record keeps a
/// pointer to the final library path instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrailerCandidate {
    /// Unique identifier (UUID).
    pub id: String,
    /// Catalog movie this candidate belongs to.
    pub movie_id: i64,
    /// Source URL; unique key within the movie.
    pub url: String,
    /// Discovery metadata from the provider.
    pub meta: TrailerMeta,
    /// Current lifecycle status.
    pub status: CandidateStatus,
    /// When the URL was first discovered.
    pub discovered_at: DateTime<Utc>,
    /// Number of download attempts made so far.
    pub attempts: u32,
    /// When the last download attempt finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Why the candidate is Broken (or why the last attempt failed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Staging file path, present when Downloaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_path: Option<PathBuf>,
    /// Final library path, present once Selected and placed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_path: Option<PathBuf>,
    /// Quality metrics, populated after a successful download.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<QualityMetrics>,
}

/// Outcome of a download attempt, recorded via `TrailerStore::mark_attempt`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Fetch and probe succeeded; the candidate holds a staging file.
    Downloaded {
        staging_path: PathBuf,
        metrics: QualityMetrics,
    },
    /// Transient failure; the candidate returns to New for a later run.
    Retryable { reason: String },
    /// Permanent failure; only an explicit reset can revive the candidate.
    Broken { reason: String },
}

/// The recorded selection for a movie: which candidate won and where it went.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionResult {
    pub movie_id: i64,
    pub candidate_id: String,
    pub final_path: PathBuf,
    pub placed_at: DateTime<Utc>,
}
