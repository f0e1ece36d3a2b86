//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the trailer pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Enable the background batch loop.
    /// When disabled, runs only happen via the API.
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between scheduled batch runs.
    #[serde(default = "default_batch_interval")]
    pub batch_interval_secs: u64,

    /// Maximum movie pipelines running at once.
    #[serde(default = "default_concurrent_movies")]
    pub max_concurrent_movies: usize,

    /// Maximum concurrent candidate downloads within one movie.
    #[serde(default = "default_concurrent_downloads")]
    pub max_concurrent_downloads: usize,

    /// Download attempts allowed for a URL that keeps answering 4xx/5xx
    /// before it is marked Broken.
    #[serde(default = "default_http_attempts")]
    pub max_http_attempts: u32,

    /// Root of the staging directory tree.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
}

fn default_batch_interval() -> u64 {
    21_600 // 6 hours
}

fn default_concurrent_movies() -> usize {
    2
}

fn default_concurrent_downloads() -> usize {
    2
}

fn default_http_attempts() -> u32 {
    3
}

fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join("trailhound")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            batch_interval_secs: default_batch_interval(),
            max_concurrent_movies: default_concurrent_movies(),
            max_concurrent_downloads: default_concurrent_downloads(),
            max_http_attempts: default_http_attempts(),
            staging_dir: default_staging_dir(),
        }
    }
}
