//! Types for the pipeline orchestrator.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::placer::PlacementError;
use crate::store::StoreError;

/// How a run was triggered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Periodic run over the whole library.
    Batch,
    /// Single movie, triggered by a catalog event.
    Event,
    /// Single movie, explicit user choice.
    Interactive,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Batch => write!(f, "batch"),
            RunMode::Event => write!(f, "event"),
            RunMode::Interactive => write!(f, "interactive"),
        }
    }
}

/// Terminal state of one movie's pipeline for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MovieOutcome {
    /// A trailer was selected and placed.
    Placed { final_path: PathBuf },
    /// Nothing to do: selection already recorded and no new candidate
    /// downloaded this run.
    Unchanged,
    /// No candidate survived selection filtering. A valid outcome, not a
    /// failure.
    NoCandidate,
    /// Discovery failed entirely; the movie will be retried next run.
    Skipped { reason: String },
    /// A stage failed; state is consistent and the run is retryable.
    Failed { error: String },
}

impl MovieOutcome {
    /// Short label for logging and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            MovieOutcome::Placed { .. } => "placed",
            MovieOutcome::Unchanged => "unchanged",
            MovieOutcome::NoCandidate => "no_candidate",
            MovieOutcome::Skipped { .. } => "skipped",
            MovieOutcome::Failed { .. } => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, MovieOutcome::Failed { .. })
    }
}

/// Per-movie entry in a run summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieReport {
    pub movie_id: i64,
    pub title: String,
    #[serde(flatten)]
    pub outcome: MovieOutcome,
}

/// End-of-run report: every movie's outcome, failures included.
///
/// Per-movie errors are collected here rather than aborting the batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// True when the run stopped early at a cancellation checkpoint.
    pub cancelled: bool,
    pub movies: Vec<MovieReport>,
}

impl RunSummary {
    pub fn placed_count(&self) -> usize {
        self.movies
            .iter()
            .filter(|m| matches!(m.outcome, MovieOutcome::Placed { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.movies.iter().filter(|m| m.outcome.is_failure()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.movies
            .iter()
            .filter(|m| matches!(m.outcome, MovieOutcome::Skipped { .. }))
            .count()
    }
}

/// What the pipeline did with a catalog event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "disposition", rename_all = "snake_case")]
pub enum EventDisposition {
    /// The movie was run through the pipeline.
    Processed { report: MovieReport },
    /// The movie's candidates and selection were deleted.
    Purged { movie_id: i64, removed: u64 },
    /// Nothing to do for this event.
    Ignored,
}

/// Pipeline status snapshot for the API.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatus {
    pub running: bool,
    pub cancel_requested: bool,
    pub last_summary: Option<RunSummary>,
}

/// Errors surfaced by pipeline entry points.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("placement error: {0}")]
    Placement(#[from] PlacementError),

    #[error("staging error: {0}")]
    Staging(#[from] std::io::Error),

    #[error("movie not found in catalog: {0}")]
    MovieNotFound(i64),

    #[error("a run is already in progress")]
    AlreadyRunning,
}
