//! Prometheus metrics for core components.
//!
//! Covers discovery, downloads (by failure kind), selection, placement,
//! and whole pipeline runs.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Discovery
// =============================================================================

/// Discovery requests by provider and result.
pub static DISCOVERY_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "trailhound_discovery_requests_total",
            "Total discovery provider calls",
        ),
        &["provider", "status"], // status: "success", "error"
    )
    .unwrap()
});

/// Candidate URLs discovered (after broken-URL suppression).
pub static CANDIDATES_DISCOVERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "trailhound_candidates_discovered_total",
        "Total candidate URLs discovered",
    )
    .unwrap()
});

// =============================================================================
// Downloads
// =============================================================================

/// Downloads started total.
pub static DOWNLOADS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "trailhound_downloads_started_total",
        "Total candidate downloads started",
    )
    .unwrap()
});

/// Downloads completed total.
pub static DOWNLOADS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "trailhound_downloads_completed_total",
        "Total candidate downloads completed successfully",
    )
    .unwrap()
});

/// Downloads failed by classified kind.
pub static DOWNLOADS_FAILED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "trailhound_downloads_failed_total",
            "Total candidate downloads that failed",
        ),
        &["kind"], // "network", "http", "content"
    )
    .unwrap()
});

// =============================================================================
// Selection and placement
// =============================================================================

/// Selection results.
pub static SELECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trailhound_selections_total", "Total selection decisions"),
        &["result"], // "selected", "no_candidate"
    )
    .unwrap()
});

/// Placement attempts by result.
pub static PLACEMENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trailhound_placements_total", "Total trailer placements"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Runs
// =============================================================================

/// Pipeline runs by mode.
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trailhound_runs_total", "Total pipeline runs"),
        &["mode"], // "batch", "event", "interactive"
    )
    .unwrap()
});

/// Run duration in seconds by mode.
pub static RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "trailhound_run_duration_seconds",
            "Duration of pipeline runs",
        )
        .buckets(vec![1.0, 5.0, 15.0, 60.0, 300.0, 900.0, 3600.0]),
        &["mode"],
    )
    .unwrap()
});

/// Movies processed by outcome.
pub static MOVIES_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "trailhound_movies_processed_total",
            "Total per-movie pipeline outcomes",
        ),
        &["outcome"], // "placed", "unchanged", "no_candidate", "skipped", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(DISCOVERY_REQUESTS.clone()),
        Box::new(CANDIDATES_DISCOVERED.clone()),
        Box::new(DOWNLOADS_STARTED.clone()),
        Box::new(DOWNLOADS_COMPLETED.clone()),
        Box::new(DOWNLOADS_FAILED.clone()),
        Box::new(SELECTIONS_TOTAL.clone()),
        Box::new(PLACEMENTS_TOTAL.clone()),
        Box::new(RUNS_TOTAL.clone()),
        Box::new(RUN_DURATION.clone()),
        Box::new(MOVIES_PROCESSED.clone()),
    ]
}
