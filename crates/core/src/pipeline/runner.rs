//! Trailer pipeline implementation.
//!
//! Drives each movie through the per-run state machine:
//! Discover -> DedupPersist -> Download -> Select -> Place -> Cleanup.
//! Movies run independently in a bounded worker pool; one movie's failure
//! never blocks another's progress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::{broadcast, RwLock, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::catalog::{CatalogEvent, Movie, MovieCatalog};
use crate::discovery::DiscoveryProvider;
use crate::downloader::{FetchError, StagingArea, TrailerDownloader};
use crate::metrics;
use crate::placer::TrailerPlacer;
use crate::selector::{select_best, SelectorConfig};
use crate::store::{
    AttemptOutcome, CandidateStatus, SelectionResult, StoreError, TrailerCandidate, TrailerStore,
};

use super::config::PipelineConfig;
use super::types::{
    EventDisposition, MovieOutcome, MovieReport, PipelineError, PipelineStatus, RunMode,
    RunSummary,
};

/// The trailer pipeline - reconciles the catalog against discovered
/// trailer URLs and keeps the best trailer placed per movie.
pub struct TrailerPipeline {
    config: PipelineConfig,
    selector: SelectorConfig,
    store: Arc<dyn TrailerStore>,
    catalog: Arc<dyn MovieCatalog>,
    providers: Vec<Arc<dyn DiscoveryProvider>>,
    downloader: Arc<dyn TrailerDownloader>,
    placer: Arc<dyn TrailerPlacer>,

    // Runtime state
    running: Arc<AtomicBool>,
    cancel_requested: Arc<AtomicBool>,
    last_summary: Arc<RwLock<Option<RunSummary>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl TrailerPipeline {
    /// Create a new pipeline.
    pub fn new(
        config: PipelineConfig,
        selector: SelectorConfig,
        store: Arc<dyn TrailerStore>,
        catalog: Arc<dyn MovieCatalog>,
        providers: Vec<Arc<dyn DiscoveryProvider>>,
        downloader: Arc<dyn TrailerDownloader>,
        placer: Arc<dyn TrailerPlacer>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            selector,
            store,
            catalog,
            providers,
            downloader,
            placer,
            running: Arc::new(AtomicBool::new(false)),
            cancel_requested: Arc::new(AtomicBool::new(false)),
            last_summary: Arc::new(RwLock::new(None)),
            shutdown_tx,
        }
    }

    /// Whether a run is currently in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Request cooperative cancellation of the current batch run.
    ///
    /// The run stops before starting the next movie; in-flight downloads
    /// finish or time out rather than being cut mid-write.
    pub fn cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    /// Status snapshot for the API.
    pub async fn status(&self) -> PipelineStatus {
        PipelineStatus {
            running: self.is_running(),
            cancel_requested: self.cancel_requested.load(Ordering::Relaxed),
            last_summary: self.last_summary.read().await.clone(),
        }
    }

    /// Run the batch pipeline over every catalog movie that has a primary
    /// file and no recorded selection.
    pub async fn run_batch(&self) -> Result<RunSummary, PipelineError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(PipelineError::AlreadyRunning);
        }
        self.cancel_requested.store(false, Ordering::SeqCst);

        let result = self.run_batch_inner().await;
        self.running.store(false, Ordering::SeqCst);

        if let Ok(ref summary) = result {
            let elapsed = (summary.finished_at - summary.started_at)
                .to_std()
                .unwrap_or(Duration::ZERO);
            metrics::RUNS_TOTAL.with_label_values(&["batch"]).inc();
            metrics::RUN_DURATION
                .with_label_values(&["batch"])
                .observe(elapsed.as_secs_f64());
            *self.last_summary.write().await = Some(summary.clone());
        }

        result
    }

    async fn run_batch_inner(&self) -> Result<RunSummary, PipelineError> {
        let started_at = Utc::now();
        let movies = self.catalog.movies().await?;
        let staging = StagingArea::create(&self.config.staging_dir).await?;
        let worker = self.worker(staging);

        let mut eligible = Vec::new();
        for movie in movies {
            if !movie.has_file {
                debug!(movie_id = movie.id, "Skipping movie without a file");
                continue;
            }
            if self.store.selection_for(movie.id)?.is_some() {
                continue;
            }
            eligible.push(movie);
        }
        info!(count = eligible.len(), "Starting batch trailer run");

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_movies.max(1)));
        let mut join_set = tokio::task::JoinSet::new();
        let mut cancelled = false;

        for movie in eligible {
            // Cancellation checkpoint between movie pipelines.
            if self.cancel_requested.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }

            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let worker = worker.clone();
            join_set.spawn(async move {
                let outcome = worker.process(&movie).await;
                drop(permit);
                MovieReport {
                    movie_id: movie.id,
                    title: movie.title,
                    outcome,
                }
            });
        }

        let mut reports = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(report) => {
                    metrics::MOVIES_PROCESSED
                        .with_label_values(&[report.outcome.label()])
                        .inc();
                    if let MovieOutcome::Failed { ref error } = report.outcome {
                        warn!(movie_id = report.movie_id, error = %error, "Movie pipeline failed");
                    }
                    reports.push(report);
                }
                Err(e) => error!("Movie pipeline task panicked: {}", e),
            }
        }

        reports.sort_by_key(|r| r.movie_id);
        let summary = RunSummary {
            mode: RunMode::Batch,
            started_at,
            finished_at: Utc::now(),
            cancelled,
            movies: reports,
        };
        info!(
            placed = summary.placed_count(),
            failed = summary.failed_count(),
            skipped = summary.skipped_count(),
            cancelled = summary.cancelled,
            "Batch trailer run finished"
        );
        Ok(summary)
    }

    /// Run the pipeline for a single movie after a catalog event.
    pub async fn run_event(&self, movie_id: i64) -> Result<MovieReport, PipelineError> {
        let movie = self
            .catalog
            .movie(movie_id)
            .await?
            .ok_or(PipelineError::MovieNotFound(movie_id))?;

        let staging = StagingArea::create(&self.config.staging_dir).await?;
        let worker = self.worker(staging);
        let outcome = worker.process(&movie).await;
        metrics::RUNS_TOTAL.with_label_values(&["event"]).inc();
        metrics::MOVIES_PROCESSED
            .with_label_values(&[outcome.label()])
            .inc();

        let report = MovieReport {
            movie_id: movie.id,
            title: movie.title,
            outcome,
        };

        *self.last_summary.write().await = Some(RunSummary {
            mode: RunMode::Event,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            cancelled: false,
            movies: vec![report.clone()],
        });

        Ok(report)
    }

    /// Dispatch a catalog webhook event.
    pub async fn handle_event(
        &self,
        event: &CatalogEvent,
    ) -> Result<EventDisposition, PipelineError> {
        match event {
            CatalogEvent::Grab { movie_id }
            | CatalogEvent::Download { movie_id }
            | CatalogEvent::Rename { movie_id } => {
                let report = self.run_event(*movie_id).await?;
                Ok(EventDisposition::Processed { report })
            }
            CatalogEvent::MovieFileDelete { movie_id, reason } => {
                if reason.eq_ignore_ascii_case("upgrade") {
                    // The replacement file triggers its own Download event.
                    Ok(EventDisposition::Ignored)
                } else {
                    let removed = self.store.purge_movie(*movie_id)?;
                    info!(movie_id, removed, "Purged candidates after file delete");
                    Ok(EventDisposition::Purged {
                        movie_id: *movie_id,
                        removed,
                    })
                }
            }
            CatalogEvent::Test => Ok(EventDisposition::Ignored),
        }
    }

    /// Interactive selection: place a specific Downloaded candidate,
    /// bypassing the automatic ranking. Downstream stages are identical.
    pub async fn run_interactive(
        &self,
        movie_id: i64,
        candidate_id: &str,
    ) -> Result<SelectionResult, PipelineError> {
        let movie = self
            .catalog
            .movie(movie_id)
            .await?
            .ok_or(PipelineError::MovieNotFound(movie_id))?;

        let candidate = self
            .store
            .candidate(candidate_id)?
            .ok_or_else(|| StoreError::NotFound(candidate_id.to_string()))?;

        if candidate.movie_id != movie_id || candidate.status != CandidateStatus::Downloaded {
            return Err(StoreError::conflict(candidate_id, candidate.status, "select").into());
        }

        let placed = self.placer.place(&movie, &candidate).await?;
        let selection = self
            .store
            .record_selection(movie_id, candidate_id, &placed.final_path)?;
        metrics::RUNS_TOTAL.with_label_values(&["interactive"]).inc();
        metrics::PLACEMENTS_TOTAL.with_label_values(&["success"]).inc();

        let staging = StagingArea::create(&self.config.staging_dir).await?;
        if let Err(e) = staging.purge_movie(movie_id, None).await {
            warn!(movie_id, "Failed to purge staging after selection: {}", e);
        }

        Ok(selection)
    }

    /// Spawn the periodic batch loop. Returns the task handle.
    pub fn spawn_batch_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let pipeline = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let interval = Duration::from_secs(self.config.batch_interval_secs.max(60));

        tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "Batch loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Batch loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        match pipeline.run_batch().await {
                            Ok(summary) => debug!(
                                placed = summary.placed_count(),
                                "Scheduled batch run finished"
                            ),
                            Err(PipelineError::AlreadyRunning) => {
                                debug!("Skipping scheduled batch: a run is in progress");
                            }
                            Err(e) => error!("Scheduled batch run failed: {}", e),
                        }
                    }
                }
            }
        })
    }

    /// Signal the batch loop to stop and cancel any in-progress run.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        self.cancel();
    }

    fn worker(&self, staging: StagingArea) -> MovieWorker {
        MovieWorker {
            store: Arc::clone(&self.store),
            providers: self.providers.clone(),
            downloader: Arc::clone(&self.downloader),
            placer: Arc::clone(&self.placer),
            selector: self.selector.clone(),
            staging,
            max_http_attempts: self.config.max_http_attempts.max(1),
            max_concurrent_downloads: self.config.max_concurrent_downloads.max(1),
        }
    }
}

/// Everything one movie's pipeline needs, cloneable into a worker task.
#[derive(Clone)]
struct MovieWorker {
    store: Arc<dyn TrailerStore>,
    providers: Vec<Arc<dyn DiscoveryProvider>>,
    downloader: Arc<dyn TrailerDownloader>,
    placer: Arc<dyn TrailerPlacer>,
    selector: SelectorConfig,
    staging: StagingArea,
    max_http_attempts: u32,
    max_concurrent_downloads: usize,
}

impl MovieWorker {
    /// Run the movie through all stages; errors become a Failed outcome so
    /// they never propagate past the movie boundary.
    async fn process(&self, movie: &Movie) -> MovieOutcome {
        match self.run_stages(movie).await {
            Ok(outcome) => outcome,
            Err(e) => MovieOutcome::Failed {
                error: e.to_string(),
            },
        }
    }

    async fn run_stages(&self, movie: &Movie) -> Result<MovieOutcome, PipelineError> {
        // Discover.
        let mut discovered = Vec::new();
        let mut provider_errors = Vec::new();
        for provider in &self.providers {
            match provider.discover(movie).await {
                Ok(trailers) => {
                    metrics::DISCOVERY_REQUESTS
                        .with_label_values(&[provider.name(), "success"])
                        .inc();
                    discovered.extend(trailers);
                }
                Err(e) => {
                    metrics::DISCOVERY_REQUESTS
                        .with_label_values(&[provider.name(), "error"])
                        .inc();
                    warn!(
                        movie_id = movie.id,
                        provider = provider.name(),
                        "Discovery failed: {}",
                        e
                    );
                    provider_errors.push(format!("{}: {}", provider.name(), e));
                }
            }
        }
        if !self.providers.is_empty() && provider_errors.len() == self.providers.len() {
            return Ok(MovieOutcome::Skipped {
                reason: provider_errors.join("; "),
            });
        }

        // Known-broken URLs are permanently out; dropping them here keeps
        // the logs quiet, the insert-if-unseen rule makes it a no-op anyway.
        let broken = self.store.broken_urls_for(movie.id)?;
        discovered.retain(|d| !broken.contains(&d.url));
        metrics::CANDIDATES_DISCOVERED.inc_by(discovered.len() as u64);

        // DedupPersist.
        self.store.upsert_candidates(movie.id, &discovered)?;

        // Download.
        let pending = self
            .store
            .candidates_for(movie.id, Some(CandidateStatus::New))?;
        let new_downloads = self.download_pending(pending).await;

        // Select.
        let existing = self.store.selection_for(movie.id)?;
        if new_downloads == 0 && existing.is_some() {
            // Re-entrant no-op: nothing new since the recorded selection.
            return Ok(MovieOutcome::Unchanged);
        }

        let downloaded = self
            .store
            .candidates_for(movie.id, Some(CandidateStatus::Downloaded))?;
        let Some(best) = select_best(&downloaded, &self.selector).cloned() else {
            metrics::SELECTIONS_TOTAL
                .with_label_values(&["no_candidate"])
                .inc();
            return Ok(if existing.is_some() {
                MovieOutcome::Unchanged
            } else {
                // Downloaded files stay staged so the interactive path can
                // still place one without re-downloading.
                MovieOutcome::NoCandidate
            });
        };
        metrics::SELECTIONS_TOTAL.with_label_values(&["selected"]).inc();

        // Place. On error the staging file is intact and no status moved,
        // so the next run retries from Select.
        let placed = match self.placer.place(movie, &best).await {
            Ok(p) => p,
            Err(e) => {
                metrics::PLACEMENTS_TOTAL.with_label_values(&["failed"]).inc();
                return Err(e.into());
            }
        };
        metrics::PLACEMENTS_TOTAL.with_label_values(&["success"]).inc();

        let selection = self
            .store
            .record_selection(movie.id, &best.id, &placed.final_path)?;
        info!(
            movie_id = movie.id,
            candidate_id = %best.id,
            path = %selection.final_path.display(),
            "Trailer placed"
        );

        // Cleanup: the selected file already moved out of staging.
        if let Err(e) = self.staging.purge_movie(movie.id, None).await {
            warn!(movie_id = movie.id, "Failed to purge staging: {}", e);
        }

        Ok(MovieOutcome::Placed {
            final_path: selection.final_path,
        })
    }

    /// Fetch the movie's New candidates with bounded concurrency.
    /// Returns how many reached Downloaded.
    async fn download_pending(&self, pending: Vec<TrailerCandidate>) -> usize {
        let results: Vec<bool> = stream::iter(pending)
            .map(|candidate| {
                let worker = self.clone();
                async move { worker.download_one(candidate).await }
            })
            .buffer_unordered(self.max_concurrent_downloads)
            .collect()
            .await;

        results.into_iter().filter(|ok| *ok).count()
    }

    async fn download_one(&self, candidate: TrailerCandidate) -> bool {
        let claimed = match self.store.claim_for_download(&candidate.id) {
            Ok(c) => c,
            Err(StoreError::Conflict { .. }) => {
                // Another worker got there first, or the status moved on.
                return false;
            }
            Err(e) => {
                warn!(candidate_id = %candidate.id, "Claim failed: {}", e);
                return false;
            }
        };

        metrics::DOWNLOADS_STARTED.inc();
        match self.downloader.fetch(&claimed, &self.staging).await {
            Ok(fetched) => {
                metrics::DOWNLOADS_COMPLETED.inc();
                let outcome = AttemptOutcome::Downloaded {
                    staging_path: fetched.staging_path,
                    metrics: fetched.metrics,
                };
                match self.store.mark_attempt(&claimed.id, outcome) {
                    Ok(_) => true,
                    Err(e) => {
                        warn!(candidate_id = %claimed.id, "Failed to record download: {}", e);
                        false
                    }
                }
            }
            Err(fetch_error) => {
                metrics::DOWNLOADS_FAILED
                    .with_label_values(&[fetch_error.kind()])
                    .inc();
                debug!(
                    candidate_id = %claimed.id,
                    url = %claimed.url,
                    "Download failed: {}",
                    fetch_error
                );
                let outcome =
                    classify_failure(&fetch_error, claimed.attempts, self.max_http_attempts);
                if let Err(e) = self.store.mark_attempt(&claimed.id, outcome) {
                    warn!(candidate_id = %claimed.id, "Failed to record attempt: {}", e);
                }
                false
            }
        }
    }
}

/// Map a classified fetch failure onto the candidate lifecycle.
///
/// Content failures are Broken immediately. HTTP failures consume one of
/// the bounded attempts and break once exhausted. Network failures retry
/// on the next scheduled run without consuming the bound.
fn classify_failure(
    error: &FetchError,
    prior_attempts: u32,
    max_http_attempts: u32,
) -> AttemptOutcome {
    let reason = error.reason();
    match error {
        FetchError::Content(_) => AttemptOutcome::Broken { reason },
        FetchError::Http { .. } if prior_attempts + 1 >= max_http_attempts => {
            AttemptOutcome::Broken { reason }
        }
        _ => AttemptOutcome::Retryable { reason },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_content_error_is_broken() {
        let outcome = classify_failure(&FetchError::Content("empty body".to_string()), 0, 3);
        assert_eq!(
            outcome,
            AttemptOutcome::Broken {
                reason: "ContentError:empty body".to_string()
            }
        );
    }

    #[test]
    fn test_classify_http_error_respects_bound() {
        let err = FetchError::Http { status: 404 };

        assert_eq!(
            classify_failure(&err, 0, 3),
            AttemptOutcome::Retryable {
                reason: "HttpError:404".to_string()
            }
        );
        assert_eq!(
            classify_failure(&err, 1, 3),
            AttemptOutcome::Retryable {
                reason: "HttpError:404".to_string()
            }
        );
        // Third attempt exhausts the bound.
        assert_eq!(
            classify_failure(&err, 2, 3),
            AttemptOutcome::Broken {
                reason: "HttpError:404".to_string()
            }
        );
    }

    #[test]
    fn test_classify_network_error_never_breaks() {
        let err = FetchError::Network("connection reset".to_string());
        assert_eq!(
            classify_failure(&err, 99, 3),
            AttemptOutcome::Retryable {
                reason: "NetworkError:connection reset".to_string()
            }
        );
    }
}
