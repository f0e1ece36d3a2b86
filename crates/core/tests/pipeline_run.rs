//! Pipeline integration tests.
//!
//! Exercise the full per-movie state machine against an in-memory store,
//! mock discovery/download collaborators, and the real file system placer:
//! - best-candidate selection and placement
//! - re-entrant no-op runs
//! - bounded HTTP retry and broken-URL permanence
//! - placement failure recovery
//! - interactive override and catalog events

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use trailhound_core::{
    pipeline::EventDisposition,
    testing::{
        fixtures, MockDiscoveryProvider, MockDownloader, MockFetch, MockMovieCatalog,
        MockTrailerPlacer,
    },
    CandidateStatus, CatalogEvent, FsPlacer, Movie, MovieOutcome, PipelineConfig, SelectorConfig,
    SqliteTrailerStore, StagingArea, TrailerCandidate, TrailerPipeline, TrailerPlacer,
    TrailerStore,
};

/// Test helper wiring a pipeline with mock collaborators.
struct TestHarness {
    pipeline: Arc<TrailerPipeline>,
    store: Arc<SqliteTrailerStore>,
    catalog: Arc<MockMovieCatalog>,
    provider: Arc<MockDiscoveryProvider>,
    downloader: Arc<MockDownloader>,
    temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_placer(Arc::new(FsPlacer::with_defaults()))
    }

    fn with_placer(placer: Arc<dyn TrailerPlacer>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let staging_dir = temp_dir.path().join("staging");

        let store = Arc::new(SqliteTrailerStore::in_memory().expect("store"));
        let catalog = Arc::new(MockMovieCatalog::new());
        let provider = Arc::new(MockDiscoveryProvider::new());
        let downloader = Arc::new(MockDownloader::new());

        let config = PipelineConfig {
            staging_dir,
            ..PipelineConfig::default()
        };

        let pipeline = Arc::new(TrailerPipeline::new(
            config,
            SelectorConfig::default(),
            Arc::clone(&store) as Arc<dyn trailhound_core::TrailerStore>,
            Arc::clone(&catalog) as Arc<dyn trailhound_core::MovieCatalog>,
            vec![Arc::clone(&provider) as Arc<dyn trailhound_core::DiscoveryProvider>],
            Arc::clone(&downloader) as Arc<dyn trailhound_core::TrailerDownloader>,
            placer,
        ));

        Self {
            pipeline,
            store,
            catalog,
            provider,
            downloader,
            temp_dir,
        }
    }

    /// Create a movie with its folder and primary file on disk, and
    /// register it with the mock catalog.
    async fn add_movie(&self, id: i64, title: &str, year: u32) -> Movie {
        let folder = self
            .temp_dir
            .path()
            .join("library")
            .join(format!("{} ({})", title, year));
        tokio::fs::create_dir_all(&folder).await.expect("movie folder");
        let movie_file = folder.join(format!("{} ({}).mkv", title, year));
        tokio::fs::write(&movie_file, b"feature film").await.expect("movie file");

        let movie = Movie {
            id,
            tmdb_id: 100_000 + id,
            title: title.to_string(),
            year,
            folder,
            movie_file: Some(movie_file),
            has_file: true,
        };
        self.catalog.add_movie(movie.clone()).await;
        movie
    }

    fn staging_dir(&self) -> PathBuf {
        self.temp_dir.path().join("staging")
    }

    fn candidate_by_url(&self, movie_id: i64, url: &str) -> TrailerCandidate {
        self.store
            .candidates_for(movie_id, None)
            .expect("candidates")
            .into_iter()
            .find(|c| c.url == url)
            .expect("candidate by url")
    }
}

#[tokio::test]
async fn test_batch_places_highest_resolution_candidate() {
    let harness = TestHarness::new();
    let movie = harness.add_movie(1, "The Matrix", 1999).await;

    harness
        .provider
        .set_trailers(
            1,
            vec![fixtures::discovered("https://a"), fixtures::discovered("https://b")],
        )
        .await;
    // A is 1080p/90s, B is 720p/95s: resolution must win.
    harness
        .downloader
        .set_success("https://a", fixtures::metrics(1920, 1080, 90, 40_000_000))
        .await;
    harness
        .downloader
        .set_success("https://b", fixtures::metrics(1280, 720, 95, 60_000_000))
        .await;

    let summary = harness.pipeline.run_batch().await.unwrap();
    assert_eq!(summary.placed_count(), 1);
    assert_eq!(summary.failed_count(), 0);

    let selected = harness.candidate_by_url(1, "https://a");
    assert_eq!(selected.status, CandidateStatus::Selected);
    let expected_path = movie.folder.join("The Matrix (1999)-trailer.mp4");
    assert_eq!(selected.final_path.as_deref(), Some(expected_path.as_path()));
    assert!(expected_path.exists());
    let content = tokio::fs::read_to_string(&expected_path).await.unwrap();
    assert_eq!(content, "mock trailer for https://a");

    let rejected = harness.candidate_by_url(1, "https://b");
    assert_eq!(rejected.status, CandidateStatus::Rejected);

    let selection = harness.store.selection_for(1).unwrap().unwrap();
    assert_eq!(selection.candidate_id, selected.id);

    // Staging is purged after placement.
    let staging = StagingArea::create(harness.staging_dir()).await.unwrap();
    assert!(!staging.movie_dir(1).exists());
}

#[tokio::test]
async fn test_rerun_after_success_is_noop() {
    let harness = TestHarness::new();
    harness.add_movie(1, "Heat", 1995).await;
    harness
        .provider
        .set_trailers(1, vec![fixtures::discovered("https://a")])
        .await;

    harness.pipeline.run_batch().await.unwrap();
    let before = harness.store.candidates_for(1, None).unwrap();
    let fetches_before = harness.downloader.fetch_calls().await.len();

    // The movie has a selection now, so the second batch run must not even
    // consider it.
    let summary = harness.pipeline.run_batch().await.unwrap();
    assert!(summary.movies.is_empty());

    let after = harness.store.candidates_for(1, None).unwrap();
    assert_eq!(before, after);
    assert_eq!(harness.downloader.fetch_calls().await.len(), fetches_before);
}

#[tokio::test]
async fn test_event_rerun_with_no_new_urls_is_unchanged() {
    let harness = TestHarness::new();
    harness.add_movie(1, "Alien", 1979).await;
    harness
        .provider
        .set_trailers(1, vec![fixtures::discovered("https://a")])
        .await;

    harness.pipeline.run_batch().await.unwrap();

    // Event mode re-runs the single movie; same URL set means no-op.
    let report = harness.pipeline.run_event(1).await.unwrap();
    assert_eq!(report.outcome, MovieOutcome::Unchanged);
}

#[tokio::test]
async fn test_http_404_breaks_after_bounded_attempts() {
    let harness = TestHarness::new();
    harness.add_movie(1, "Brazil", 1985).await;
    harness
        .provider
        .set_trailers(1, vec![fixtures::discovered("https://c")])
        .await;
    harness
        .downloader
        .set_behavior("https://c", MockFetch::Http(404))
        .await;

    // Attempts one and two leave the candidate retryable.
    for expected_attempts in 1..=2 {
        harness.pipeline.run_batch().await.unwrap();
        let candidate = harness.candidate_by_url(1, "https://c");
        assert_eq!(candidate.status, CandidateStatus::New);
        assert_eq!(candidate.attempts, expected_attempts);
        assert_eq!(candidate.failure_reason.as_deref(), Some("HttpError:404"));
    }

    // Third consecutive failure exhausts the bound.
    harness.pipeline.run_batch().await.unwrap();
    let candidate = harness.candidate_by_url(1, "https://c");
    assert_eq!(candidate.status, CandidateStatus::Broken);
    assert_eq!(candidate.failure_reason.as_deref(), Some("HttpError:404"));
    assert_eq!(harness.downloader.fetch_count("https://c").await, 3);

    // Broken candidates are never fetched again.
    harness.pipeline.run_batch().await.unwrap();
    assert_eq!(harness.downloader.fetch_count("https://c").await, 3);
}

#[tokio::test]
async fn test_content_error_is_permanent_until_reset() {
    let harness = TestHarness::new();
    harness.add_movie(1, "Stalker", 1979).await;
    harness
        .provider
        .set_trailers(1, vec![fixtures::discovered("https://d")])
        .await;
    harness
        .downloader
        .set_behavior("https://d", MockFetch::Content("not a video".to_string()))
        .await;

    harness.pipeline.run_batch().await.unwrap();
    let candidate = harness.candidate_by_url(1, "https://d");
    assert_eq!(candidate.status, CandidateStatus::Broken);
    assert_eq!(
        candidate.failure_reason.as_deref(),
        Some("ContentError:not a video")
    );
    assert_eq!(harness.downloader.fetch_count("https://d").await, 1);

    // Re-running does not touch a Broken candidate.
    harness.pipeline.run_batch().await.unwrap();
    assert_eq!(harness.downloader.fetch_count("https://d").await, 1);

    // Only an explicit reset revives it.
    harness.store.reset_candidate(&candidate.id).unwrap();
    harness
        .downloader
        .set_success("https://d", fixtures::metrics(1280, 720, 90, 10_000_000))
        .await;
    let summary = harness.pipeline.run_batch().await.unwrap();
    assert_eq!(summary.placed_count(), 1);
    assert_eq!(harness.downloader.fetch_count("https://d").await, 2);
}

#[tokio::test]
async fn test_network_errors_retry_without_bound() {
    let harness = TestHarness::new();
    harness.add_movie(1, "Solaris", 1972).await;
    harness
        .provider
        .set_trailers(1, vec![fixtures::discovered("https://e")])
        .await;
    harness
        .downloader
        .set_behavior("https://e", MockFetch::Network("connection reset".to_string()))
        .await;

    // Well past the HTTP bound, the candidate keeps returning to New.
    for _ in 0..5 {
        harness.pipeline.run_batch().await.unwrap();
    }
    let candidate = harness.candidate_by_url(1, "https://e");
    assert_eq!(candidate.status, CandidateStatus::New);
    assert_eq!(candidate.attempts, 5);
    assert_eq!(harness.downloader.fetch_count("https://e").await, 5);
}

#[tokio::test]
async fn test_provider_failure_skips_movie() {
    let harness = TestHarness::new();
    harness.add_movie(1, "Dune", 2021).await;
    harness.provider.set_fail_always(true).await;

    let summary = harness.pipeline.run_batch().await.unwrap();
    assert_eq!(summary.movies.len(), 1);
    assert!(matches!(
        summary.movies[0].outcome,
        MovieOutcome::Skipped { .. }
    ));
    assert!(harness.store.candidates_for(1, None).unwrap().is_empty());
}

#[tokio::test]
async fn test_no_candidate_when_duration_outside_window() {
    let harness = TestHarness::new();
    harness.add_movie(1, "Akira", 1988).await;
    harness
        .provider
        .set_trailers(1, vec![fixtures::discovered("https://f")])
        .await;
    // Ten-second bumper: filtered before ranking.
    harness
        .downloader
        .set_success("https://f", fixtures::metrics(3840, 2160, 10, 90_000_000))
        .await;

    let summary = harness.pipeline.run_batch().await.unwrap();
    assert_eq!(summary.movies[0].outcome, MovieOutcome::NoCandidate);

    // The download itself succeeded and stays staged for manual override.
    let candidate = harness.candidate_by_url(1, "https://f");
    assert_eq!(candidate.status, CandidateStatus::Downloaded);
    assert!(candidate.staging_path.as_deref().unwrap().exists());
    assert!(harness.store.selection_for(1).unwrap().is_none());
}

#[tokio::test]
async fn test_placement_failure_leaves_retryable_state() {
    let harness = TestHarness::new();
    let movie = harness.add_movie(1, "Ran", 1985).await;
    harness
        .provider
        .set_trailers(1, vec![fixtures::discovered("https://g")])
        .await;

    // Sabotage placement by removing the library folder.
    tokio::fs::remove_dir_all(&movie.folder).await.unwrap();

    let summary = harness.pipeline.run_batch().await.unwrap();
    assert!(summary.movies[0].outcome.is_failure());

    // Candidate is still Downloaded with its staging file byte-identical.
    let candidate = harness.candidate_by_url(1, "https://g");
    assert_eq!(candidate.status, CandidateStatus::Downloaded);
    let staging_path = candidate.staging_path.clone().unwrap();
    let staged = tokio::fs::read_to_string(&staging_path).await.unwrap();
    assert_eq!(staged, "mock trailer for https://g");
    assert!(harness.store.selection_for(1).unwrap().is_none());
    // Nothing partial reached the final tree.
    assert!(!movie.folder.exists());

    // Restore the folder: the next run places without re-downloading.
    tokio::fs::create_dir_all(&movie.folder).await.unwrap();
    let summary = harness.pipeline.run_batch().await.unwrap();
    assert_eq!(summary.placed_count(), 1);
    assert_eq!(harness.downloader.fetch_count("https://g").await, 1);
}

#[tokio::test]
async fn test_interactive_selection_overrides_ranking() {
    let harness = TestHarness::new();
    let movie = harness.add_movie(1, "Tampopo", 1985).await;
    harness
        .provider
        .set_trailers(
            1,
            vec![fixtures::discovered("https://hd"), fixtures::discovered("https://sd")],
        )
        .await;
    harness
        .downloader
        .set_success("https://hd", fixtures::metrics(1920, 1080, 10, 40_000_000))
        .await;
    harness
        .downloader
        .set_success("https://sd", fixtures::metrics(640, 360, 12, 5_000_000))
        .await;

    // Both downloads are outside the duration window, so the automatic run
    // ends in NoCandidate and leaves them staged.
    let summary = harness.pipeline.run_batch().await.unwrap();
    assert_eq!(summary.movies[0].outcome, MovieOutcome::NoCandidate);

    // The user insists on the SD one.
    let sd = harness.candidate_by_url(1, "https://sd");
    let selection = harness.pipeline.run_interactive(1, &sd.id).await.unwrap();
    assert_eq!(selection.candidate_id, sd.id);
    assert!(selection.final_path.exists());
    assert_eq!(
        selection.final_path,
        movie.folder.join("Tampopo (1985)-trailer.mp4")
    );

    let hd = harness.candidate_by_url(1, "https://hd");
    assert_eq!(hd.status, CandidateStatus::Rejected);
    // Staging is purged after the interactive placement too.
    let staging = StagingArea::create(harness.staging_dir()).await.unwrap();
    assert!(!staging.movie_dir(1).exists());
}

#[tokio::test]
async fn test_interactive_rejects_non_downloaded_candidate() {
    let harness = TestHarness::new();
    harness.add_movie(1, "Seven", 1995).await;
    harness
        .provider
        .set_trailers(1, vec![fixtures::discovered("https://x")])
        .await;
    harness
        .downloader
        .set_behavior("https://x", MockFetch::Content("junk".to_string()))
        .await;

    harness.pipeline.run_batch().await.unwrap();
    let broken = harness.candidate_by_url(1, "https://x");

    let result = harness.pipeline.run_interactive(1, &broken.id).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_movies_without_file_are_not_processed() {
    let harness = TestHarness::new();
    let folder = harness.temp_dir.path().join("library").join("Nope (2022)");
    harness
        .catalog
        .add_movie(fixtures::movie_without_file(1, "Nope", 2022, &folder))
        .await;

    let summary = harness.pipeline.run_batch().await.unwrap();
    assert!(summary.movies.is_empty());
    assert!(harness.provider.discover_calls().await.is_empty());
}

#[tokio::test]
async fn test_file_delete_event_purges_candidates() {
    let harness = TestHarness::new();
    harness.add_movie(1, "Psycho", 1960).await;
    harness
        .provider
        .set_trailers(1, vec![fixtures::discovered("https://a")])
        .await;
    harness.pipeline.run_batch().await.unwrap();
    assert!(!harness.store.candidates_for(1, None).unwrap().is_empty());

    // Upgrades keep state: the replacement triggers its own event.
    let upgrade = CatalogEvent::MovieFileDelete {
        movie_id: 1,
        reason: "upgrade".to_string(),
    };
    assert_eq!(
        harness.pipeline.handle_event(&upgrade).await.unwrap(),
        EventDisposition::Ignored
    );
    assert!(!harness.store.candidates_for(1, None).unwrap().is_empty());

    // A real removal purges everything.
    let delete = CatalogEvent::MovieFileDelete {
        movie_id: 1,
        reason: "deleted".to_string(),
    };
    let disposition = harness.pipeline.handle_event(&delete).await.unwrap();
    assert!(matches!(disposition, EventDisposition::Purged { .. }));
    assert!(harness.store.candidates_for(1, None).unwrap().is_empty());
    assert!(harness.store.selection_for(1).unwrap().is_none());
}

#[tokio::test]
async fn test_selection_recorded_at_placer_reported_path() {
    let mock_placer = Arc::new(MockTrailerPlacer::new());
    let harness = TestHarness::with_placer(Arc::clone(&mock_placer) as Arc<dyn TrailerPlacer>);
    harness.add_movie(1, "Rashomon", 1950).await;
    harness
        .provider
        .set_trailers(1, vec![fixtures::discovered("https://a")])
        .await;

    let summary = harness.pipeline.run_batch().await.unwrap();
    assert_eq!(summary.placed_count(), 1);

    let placements = mock_placer.placements().await;
    assert_eq!(placements.len(), 1);
    let (movie_id, candidate_id, final_path) = &placements[0];
    assert_eq!(*movie_id, 1);

    // The store's selection points exactly where the placer put the file.
    let selection = harness.store.selection_for(1).unwrap().unwrap();
    assert_eq!(&selection.candidate_id, candidate_id);
    assert_eq!(&selection.final_path, final_path);
}

#[tokio::test]
async fn test_partial_failure_isolation_across_movies() {
    let harness = TestHarness::new();
    harness.add_movie(1, "Good Movie", 2000).await;
    harness.add_movie(2, "Bad Movie", 2001).await;
    harness
        .provider
        .set_trailers(1, vec![fixtures::discovered("https://good")])
        .await;
    harness
        .provider
        .set_trailers(2, vec![fixtures::discovered("https://bad")])
        .await;
    harness
        .downloader
        .set_behavior("https://bad", MockFetch::Http(500))
        .await;

    let summary = harness.pipeline.run_batch().await.unwrap();
    assert_eq!(summary.movies.len(), 2);
    assert_eq!(summary.placed_count(), 1);

    // Movie 1 placed despite movie 2 having nothing downloadable.
    let good = harness.candidate_by_url(1, "https://good");
    assert_eq!(good.status, CandidateStatus::Selected);
    let bad = harness.candidate_by_url(2, "https://bad");
    assert_eq!(bad.status, CandidateStatus::New);
}

#[tokio::test]
async fn test_discovered_urls_join_existing_candidates() {
    let harness = TestHarness::new();
    harness.add_movie(1, "Arrival", 2016).await;

    // First run discovers one URL but the download keeps failing.
    harness
        .provider
        .set_trailers(1, vec![fixtures::discovered("https://old")])
        .await;
    harness
        .downloader
        .set_behavior("https://old", MockFetch::Network("reset".to_string()))
        .await;
    harness.pipeline.run_batch().await.unwrap();

    // Next run discovers an extra URL; both get attempted.
    harness
        .provider
        .set_trailers(
            1,
            vec![fixtures::discovered("https://old"), fixtures::discovered("https://new")],
        )
        .await;
    harness
        .downloader
        .set_success("https://old", fixtures::metrics(1920, 1080, 90, 40_000_000))
        .await;
    let summary = harness.pipeline.run_batch().await.unwrap();

    assert_eq!(summary.placed_count(), 1);
    assert_eq!(harness.store.candidates_for(1, None).unwrap().len(), 2);
    let selected = harness.candidate_by_url(1, "https://old");
    assert_eq!(selected.status, CandidateStatus::Selected);
}
