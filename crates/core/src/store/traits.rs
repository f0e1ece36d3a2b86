//! Trailer store trait and error types.

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use crate::discovery::DiscoveredTrailer;
use crate::store::{AttemptOutcome, CandidateStatus, SelectionResult, TrailerCandidate};

/// Error type for trailer store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Candidate (or movie record) not found.
    #[error("candidate not found: {0}")]
    NotFound(String),

    /// Operation not allowed in the candidate's current status.
    #[error("cannot {operation} candidate {candidate_id}: status is {status}")]
    Conflict {
        candidate_id: String,
        status: CandidateStatus,
        operation: String,
    },

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    pub(crate) fn conflict(
        candidate_id: &str,
        status: CandidateStatus,
        operation: &str,
    ) -> Self {
        Self::Conflict {
            candidate_id: candidate_id.to_string(),
            status,
            operation: operation.to_string(),
        }
    }
}

/// Persistent record of trailer candidates and selections.
///
/// All persistent pipeline state lives behind this trait; other components
/// only hold candidate copies for the duration of one run. Writes to a
/// single candidate are serialized by the implementation, and
/// `record_selection` is atomic across the movie's candidate set.
pub trait TrailerStore: Send + Sync {
    /// Insert URLs not previously seen for this movie (status New) and
    /// return the movie's full candidate set, unique by URL.
    ///
    /// Idempotent: repeating the same URL set creates no duplicates. A URL
    /// that already exists keeps its record untouched, whatever its status,
    /// so re-discovering a Broken URL is a no-op.
    fn upsert_candidates(
        &self,
        movie_id: i64,
        discovered: &[DiscoveredTrailer],
    ) -> Result<Vec<TrailerCandidate>, StoreError>;

    /// Point read by candidate id.
    fn candidate(&self, candidate_id: &str) -> Result<Option<TrailerCandidate>, StoreError>;

    /// Read the movie's candidates, optionally filtered by status.
    fn candidates_for(
        &self,
        movie_id: i64,
        status: Option<CandidateStatus>,
    ) -> Result<Vec<TrailerCandidate>, StoreError>;

    /// URLs of the movie's Broken candidates, for discovery-noise suppression.
    fn broken_urls_for(&self, movie_id: i64) -> Result<HashSet<String>, StoreError>;

    /// Claim a New candidate for download (New -> Downloading).
    ///
    /// Fails with `Conflict` if the candidate is in any other status, which
    /// is the guard against two workers fetching the same URL.
    fn claim_for_download(&self, candidate_id: &str) -> Result<TrailerCandidate, StoreError>;

    /// Record the outcome of a download attempt. Last write wins.
    fn mark_attempt(
        &self,
        candidate_id: &str,
        outcome: AttemptOutcome,
    ) -> Result<TrailerCandidate, StoreError>;

    /// Record the movie's selection after a successful placement.
    ///
    /// The candidate must be Downloaded (`Conflict` otherwise). It becomes
    /// Selected with the final path; every other Downloaded candidate and
    /// any previously Selected candidate becomes Rejected, all in one
    /// transaction, so at most one candidate per movie is ever Selected.
    fn record_selection(
        &self,
        movie_id: i64,
        candidate_id: &str,
        final_path: &Path,
    ) -> Result<SelectionResult, StoreError>;

    /// The movie's recorded selection, if any.
    fn selection_for(&self, movie_id: i64) -> Result<Option<SelectionResult>, StoreError>;

    /// Return a Broken or Rejected candidate to New (user-triggered).
    ///
    /// Clears the failure reason, metrics, paths, and attempt counter.
    fn reset_candidate(&self, candidate_id: &str) -> Result<TrailerCandidate, StoreError>;

    /// Delete all candidates and the selection for a movie.
    ///
    /// Used when the catalog reports the movie's file is gone for good.
    /// Returns the number of deleted candidates.
    fn purge_movie(&self, movie_id: i64) -> Result<u64, StoreError>;
}
