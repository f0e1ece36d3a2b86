//! Staging area for downloaded-but-not-yet-placed trailer files.

use std::path::{Path, PathBuf};

use tokio::fs;

/// Handle over the on-disk staging directory.
///
/// One instance is created per pipeline run and passed to the downloader
/// and placement stages; nothing else touches the directory. Layout is one
/// subdirectory per movie with one file per candidate, so concurrent
/// downloads never collide and a re-download overwrites its own earlier
/// artifact instead of accumulating.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Open the staging area, creating the root directory if needed.
    pub async fn create(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one movie's staged candidates.
    pub fn movie_dir(&self, movie_id: i64) -> PathBuf {
        self.root.join(format!("movie-{}", movie_id))
    }

    /// Create and return the movie's staging directory.
    pub async fn ensure_movie_dir(&self, movie_id: i64) -> std::io::Result<PathBuf> {
        let dir = self.movie_dir(movie_id);
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Staging path for a candidate's download.
    pub fn candidate_path(&self, movie_id: i64, candidate_id: &str, extension: &str) -> PathBuf {
        self.movie_dir(movie_id)
            .join(format!("{}.{}", candidate_id, extension))
    }

    /// Remove the movie's staged files, optionally keeping one path.
    pub async fn purge_movie(&self, movie_id: i64, keep: Option<&Path>) -> std::io::Result<()> {
        let dir = self.movie_dir(movie_id);
        if !dir.exists() {
            return Ok(());
        }

        let mut entries = fs::read_dir(&dir).await?;
        let mut kept_any = false;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if Some(path.as_path()) == keep {
                kept_any = true;
                continue;
            }
            if path.is_file() {
                fs::remove_file(&path).await?;
            }
        }

        if !kept_any {
            // Ignore failure: a concurrent writer may have re-created it.
            let _ = fs::remove_dir(&dir).await;
        }
        Ok(())
    }
}
