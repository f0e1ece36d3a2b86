//! Best-trailer selection.
//!
//! Pure, deterministic ranking over a movie's Downloaded candidates.

mod config;

pub use config::SelectorConfig;

use std::cmp::Ordering;

use crate::store::{CandidateStatus, QualityMetrics, TrailerCandidate};

/// Pick the best Downloaded candidate, or `None` if nothing qualifies.
///
/// Filtering happens first: only Downloaded candidates with metrics inside
/// the configured duration window are ranked. Ranking is resolution
/// descending, then file size descending, then discovery time ascending,
/// with the URL as the last tie-break so the order is total. `None` is the
/// valid "no suitable trailer" outcome, not an error.
pub fn select_best<'a>(
    candidates: &'a [TrailerCandidate],
    config: &SelectorConfig,
) -> Option<&'a TrailerCandidate> {
    let mut eligible: Vec<(&TrailerCandidate, QualityMetrics)> = candidates
        .iter()
        .filter(|c| c.status == CandidateStatus::Downloaded)
        .filter_map(|c| c.metrics.map(|m| (c, m)))
        .filter(|(_, m)| {
            m.duration_secs >= config.min_duration_secs
                && m.duration_secs <= config.max_duration_secs
        })
        .collect();

    eligible.sort_by(|a, b| compare(a, b));
    eligible.first().map(|(c, _)| *c)
}

/// Total order over eligible candidates, best first.
fn compare(
    (a, ma): &(&TrailerCandidate, QualityMetrics),
    (b, mb): &(&TrailerCandidate, QualityMetrics),
) -> Ordering {
    mb.resolution()
        .cmp(&ma.resolution())
        .then_with(|| mb.size_bytes.cmp(&ma.size_bytes))
        .then_with(|| a.discovered_at.cmp(&b.discovered_at))
        .then_with(|| a.url.cmp(&b.url))
}
