mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trailhound_core::{
    create_authenticator, load_config, validate_config, Authenticator, DiscoveryProvider,
    FfprobeProbe, FsPlacer, HttpDownloader, HttpMovieCatalog, MediaProbe, MovieCatalog,
    SqliteTrailerStore, TmdbProvider, TrailerDownloader, TrailerPipeline, TrailerPlacer,
    TrailerStore,
};

use api::create_router;
use state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("TRAILHOUND_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("trailhound {} starting", VERSION);
    info!("Auth method: {:?}", config.auth.method);
    info!("Database path: {:?}", config.database.path);

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> =
        Arc::from(create_authenticator(&config.auth).context("Failed to create authenticator")?);
    info!("Using authenticator: {}", authenticator.method_name());

    // Create SQLite trailer store
    let store: Arc<dyn TrailerStore> = Arc::new(
        SqliteTrailerStore::new(&config.database.path)
            .context("Failed to create trailer store")?,
    );
    info!("Trailer store initialized");

    // Create catalog client
    let catalog: Arc<dyn MovieCatalog> = Arc::new(
        HttpMovieCatalog::new(config.catalog.clone())
            .context("Failed to create catalog client")?,
    );
    info!("Catalog client initialized: {}", config.catalog.url);

    // Create discovery providers
    let mut providers: Vec<Arc<dyn DiscoveryProvider>> = Vec::new();
    if let Some(tmdb_config) = config.discovery.tmdb.clone() {
        providers.push(Arc::new(
            TmdbProvider::new(tmdb_config).context("Failed to create TMDB provider")?,
        ));
        info!("TMDB discovery provider enabled");
    }
    if providers.is_empty() {
        warn!("No discovery providers configured; runs will only retry known candidates");
    }

    // Create downloader and placer
    let probe: Arc<dyn MediaProbe> = Arc::new(FfprobeProbe::new(
        config.downloader.ffprobe_path.clone(),
        config.downloader.probe_timeout_secs,
    ));
    let downloader: Arc<dyn TrailerDownloader> = Arc::new(
        HttpDownloader::new(&config.downloader, probe).context("Failed to create downloader")?,
    );
    let placer: Arc<dyn TrailerPlacer> = Arc::new(FsPlacer::new(config.placer.clone()));

    // Create the pipeline
    let pipeline = Arc::new(TrailerPipeline::new(
        config.pipeline.clone(),
        config.selector.clone(),
        Arc::clone(&store),
        Arc::clone(&catalog),
        providers,
        downloader,
        placer,
    ));

    // Spawn the periodic batch loop if enabled
    let batch_loop = if config.pipeline.enabled {
        Some(pipeline.spawn_batch_loop())
    } else {
        info!("Batch loop disabled; runs only happen via the API");
        None
    };

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(
        config,
        authenticator,
        store,
        Arc::clone(&pipeline),
    ));
    let router = create_router(state);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down");
    pipeline.shutdown();
    if let Some(handle) = batch_loop {
        let _ = handle.await;
    }

    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("Received shutdown signal");
}
