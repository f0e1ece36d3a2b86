//! File system placer implementation.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use sha2::{Digest, Sha256};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::warn;

use crate::catalog::Movie;
use crate::store::TrailerCandidate;

use super::config::PlacerConfig;
use super::error::PlacementError;
use super::traits::TrailerPlacer;
use super::types::{ChecksumType, PlacedTrailer};

/// Characters that cannot appear in a library filename.
static ILLEGAL_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("static regex"));

/// Incremental hasher over the configured checksum type.
enum Hasher {
    Sha256(Sha256),
    Md5(md5::Context),
}

impl Hasher {
    fn new(checksum_type: ChecksumType) -> Self {
        match checksum_type {
            ChecksumType::Sha256 => Hasher::Sha256(Sha256::new()),
            ChecksumType::Md5 => Hasher::Md5(md5::Context::new()),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Hasher::Sha256(h) => h.update(bytes),
            Hasher::Md5(c) => c.consume(bytes),
        }
    }

    fn finalize(self) -> String {
        match self {
            Hasher::Sha256(h) => format!("{:x}", h.finalize()),
            Hasher::Md5(c) => format!("{:x}", c.compute()),
        }
    }
}

/// File system based trailer placer.
///
/// Prefers an atomic rename; when source and destination live on different
/// volumes it copies to a hidden partial file, verifies the checksum,
/// renames into place, and only then deletes the source. The final path is
/// therefore never visible in a half-written state.
pub struct FsPlacer {
    config: PlacerConfig,
}

impl FsPlacer {
    /// Creates a new file system placer with the given configuration.
    pub fn new(config: PlacerConfig) -> Self {
        Self { config }
    }

    /// Creates a placer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(PlacerConfig::default())
    }

    /// Render the trailer filename (without extension) for a movie.
    fn render_filename(&self, movie: &Movie) -> String {
        let stem = movie
            .file_stem()
            .unwrap_or_else(|| format!("{} ({})", movie.title, movie.year));

        let rendered = self
            .config
            .trailer_filename
            .replace("{stem}", &stem)
            .replace("{title}", &movie.title)
            .replace("{year}", &movie.year.to_string());

        ILLEGAL_FILENAME_CHARS
            .replace_all(&rendered, "")
            .trim()
            .trim_end_matches('.')
            .to_string()
    }

    /// Final library path for the staged file.
    fn final_path(&self, movie: &Movie, source: &Path) -> PathBuf {
        let extension = source
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "mp4".to_string());
        movie
            .folder
            .join(format!("{}.{}", self.render_filename(movie), extension))
    }

    /// Attempts to move a file atomically (rename).
    async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
        match fs::rename(source, destination).await {
            Ok(()) => Ok(true),
            Err(e) => {
                // Cross-filesystem moves fail with EXDEV (18 on Linux).
                if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Copies a file while hashing the bytes read from the source.
    async fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(u64, String), PlacementError> {
        let source_file = File::open(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlacementError::SourceNotFound {
                    path: source.to_path_buf(),
                }
            } else {
                PlacementError::Io(e)
            }
        })?;

        let dest_file = File::create(destination).await.map_err(|e| {
            PlacementError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);
        let mut hasher = Hasher::new(self.config.verify_checksum);

        let mut total_bytes = 0u64;
        let mut buffer = vec![0u8; self.config.buffer_size];

        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(|e| {
                PlacementError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            if bytes_read == 0 {
                break;
            }

            hasher.update(&buffer[..bytes_read]);
            writer.write_all(&buffer[..bytes_read]).await.map_err(|e| {
                PlacementError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            total_bytes += bytes_read as u64;
        }

        writer.flush().await.map_err(|e| {
            PlacementError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        Ok((total_bytes, hasher.finalize()))
    }

    /// Calculates the checksum of a file using the configured algorithm.
    async fn calculate_checksum(&self, path: &Path) -> Result<String, PlacementError> {
        let file = File::open(path)
            .await
            .map_err(|e| PlacementError::ChecksumCalculationFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut hasher = Hasher::new(self.config.verify_checksum);

        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(|e| {
                PlacementError::ChecksumCalculationFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hasher.finalize())
    }

    /// Copy-then-verify-then-rename fallback for cross-volume moves.
    ///
    /// The destination only ever transitions from absent (or the old
    /// trailer) to the fully verified new file.
    async fn copy_verify_replace(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(u64, Option<String>), PlacementError> {
        let partial = partial_path(destination);

        let result = async {
            let (bytes, source_hash) = self.copy_file(source, &partial).await?;

            let written_hash = self.calculate_checksum(&partial).await?;
            if written_hash != source_hash {
                return Err(PlacementError::ChecksumMismatch {
                    path: partial.clone(),
                    expected: source_hash,
                    actual: written_hash,
                });
            }

            fs::rename(&partial, destination).await.map_err(|e| {
                PlacementError::move_failed(partial.clone(), destination.to_path_buf(), e)
            })?;

            Ok((bytes, Some(source_hash)))
        }
        .await;

        if result.is_err() && partial.exists() {
            let _ = fs::remove_file(&partial).await;
        }

        if result.is_ok() {
            // The verified copy is in place; a failed source delete only
            // leaves a stale staging file for the next cleanup pass.
            if let Err(e) = fs::remove_file(source).await {
                warn!(
                    "Failed to remove staged source {}: {}",
                    source.display(),
                    e
                );
            }
        }

        result
    }
}

/// Hidden sibling path used while copying.
fn partial_path(destination: &Path) -> PathBuf {
    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "trailer".to_string());
    destination.with_file_name(format!(".{}.partial", file_name))
}

#[async_trait]
impl TrailerPlacer for FsPlacer {
    fn name(&self) -> &str {
        "fs"
    }

    async fn place(
        &self,
        movie: &Movie,
        candidate: &TrailerCandidate,
    ) -> Result<PlacedTrailer, PlacementError> {
        let start = Instant::now();

        let source = candidate
            .staging_path
            .as_deref()
            .ok_or_else(|| PlacementError::NotStaged {
                candidate_id: candidate.id.clone(),
            })?;

        if !source.exists() {
            return Err(PlacementError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }

        // Placing into a folder the library manager has not created would
        // orphan the trailer; surface it instead.
        if !movie.folder.is_dir() {
            return Err(PlacementError::MovieFolderMissing {
                path: movie.folder.clone(),
            });
        }

        let destination = self.final_path(movie, source);

        let (size_bytes, checksum) = if self.config.prefer_atomic_moves
            && Self::try_atomic_move(source, &destination)
                .await
                .map_err(|e| {
                    PlacementError::move_failed(source.to_path_buf(), destination.clone(), e)
                })? {
            let meta = fs::metadata(&destination).await?;
            (meta.len(), None)
        } else {
            self.copy_verify_replace(source, &destination).await?
        };

        Ok(PlacedTrailer {
            candidate_id: candidate.id.clone(),
            final_path: destination,
            size_bytes,
            checksum,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
