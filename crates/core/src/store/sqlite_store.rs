//! SQLite-backed trailer store implementation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::discovery::DiscoveredTrailer;
use crate::store::{
    AttemptOutcome, CandidateStatus, QualityMetrics, SelectionResult, StoreError, TrailerCandidate,
    TrailerMeta, TrailerStore,
};

const CANDIDATE_COLUMNS: &str = "id, movie_id, url, meta, status, discovered_at, attempts, \
     last_attempt_at, failure_reason, staging_path, final_path, \
     width, height, duration_secs, size_bytes";

/// SQLite-backed trailer store.
///
/// The connection sits behind a mutex, so every write is serialized; the
/// multi-row `record_selection` additionally runs inside a transaction so
/// the single-Selected invariant holds even across process crashes. A
/// partial unique index backs the same invariant at the schema level.
pub struct SqliteTrailerStore {
    conn: Mutex<Connection>,
}

impl SqliteTrailerStore {
    /// Open (or create) the store at the given path.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS candidates (
                id TEXT PRIMARY KEY,
                movie_id INTEGER NOT NULL,
                url TEXT NOT NULL,
                meta TEXT NOT NULL,
                status TEXT NOT NULL,
                discovered_at TEXT NOT NULL,
                attempts INTEGER NOT NULL DEFAULT 0,
                last_attempt_at TEXT,
                failure_reason TEXT,
                staging_path TEXT,
                final_path TEXT,
                width INTEGER,
                height INTEGER,
                duration_secs INTEGER,
                size_bytes INTEGER,
                UNIQUE(movie_id, url)
            );

            CREATE TABLE IF NOT EXISTS selections (
                movie_id INTEGER PRIMARY KEY,
                candidate_id TEXT NOT NULL,
                final_path TEXT NOT NULL,
                placed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_candidates_movie ON candidates(movie_id);
            CREATE INDEX IF NOT EXISTS idx_candidates_status ON candidates(status);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_candidates_one_selected
                ON candidates(movie_id) WHERE status = 'selected';
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_candidate(row: &rusqlite::Row) -> rusqlite::Result<TrailerCandidate> {
        let id: String = row.get(0)?;
        let movie_id: i64 = row.get(1)?;
        let url: String = row.get(2)?;
        let meta_json: String = row.get(3)?;
        let status_str: String = row.get(4)?;
        let discovered_at_str: String = row.get(5)?;
        let attempts: u32 = row.get(6)?;
        let last_attempt_at_str: Option<String> = row.get(7)?;
        let failure_reason: Option<String> = row.get(8)?;
        let staging_path: Option<String> = row.get(9)?;
        let final_path: Option<String> = row.get(10)?;
        let width: Option<u32> = row.get(11)?;
        let height: Option<u32> = row.get(12)?;
        let duration_secs: Option<u32> = row.get(13)?;
        let size_bytes: Option<u64> = row.get(14)?;

        let meta: TrailerMeta = serde_json::from_str(&meta_json).unwrap_or_default();
        let status = CandidateStatus::parse(&status_str).unwrap_or(CandidateStatus::New);

        let discovered_at = DateTime::parse_from_rfc3339(&discovered_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let last_attempt_at = last_attempt_at_str.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        });

        let metrics = match (width, height, duration_secs, size_bytes) {
            (Some(width), Some(height), Some(duration_secs), Some(size_bytes)) => {
                Some(QualityMetrics {
                    width,
                    height,
                    duration_secs,
                    size_bytes,
                })
            }
            _ => None,
        };

        Ok(TrailerCandidate {
            id,
            movie_id,
            url,
            meta,
            status,
            discovered_at,
            attempts,
            last_attempt_at,
            failure_reason,
            staging_path: staging_path.map(PathBuf::from),
            final_path: final_path.map(PathBuf::from),
            metrics,
        })
    }

    fn get_by_id(conn: &Connection, candidate_id: &str) -> Result<TrailerCandidate, StoreError> {
        let sql = format!("SELECT {} FROM candidates WHERE id = ?", CANDIDATE_COLUMNS);
        conn.query_row(&sql, params![candidate_id], Self::row_to_candidate)
            .optional()
            .map_err(|e| StoreError::Database(e.to_string()))?
            .ok_or_else(|| StoreError::NotFound(candidate_id.to_string()))
    }

    fn row_to_selection(row: &rusqlite::Row) -> rusqlite::Result<SelectionResult> {
        let movie_id: i64 = row.get(0)?;
        let candidate_id: String = row.get(1)?;
        let final_path: String = row.get(2)?;
        let placed_at_str: String = row.get(3)?;

        let placed_at = DateTime::parse_from_rfc3339(&placed_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(SelectionResult {
            movie_id,
            candidate_id,
            final_path: PathBuf::from(final_path),
            placed_at,
        })
    }
}

impl TrailerStore for SqliteTrailerStore {
    fn upsert_candidates(
        &self,
        movie_id: i64,
        discovered: &[DiscoveredTrailer],
    ) -> Result<Vec<TrailerCandidate>, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        for trailer in discovered {
            let meta_json = serde_json::to_string(&TrailerMeta::from(trailer))
                .map_err(|e| StoreError::Database(e.to_string()))?;
            tx.execute(
                "INSERT OR IGNORE INTO candidates \
                 (id, movie_id, url, meta, status, discovered_at, attempts) \
                 VALUES (?, ?, ?, ?, 'new', ?, 0)",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    movie_id,
                    trailer.url,
                    meta_json,
                    now,
                ],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        }

        let sql = format!(
            "SELECT {} FROM candidates WHERE movie_id = ? ORDER BY discovered_at ASC, url ASC",
            CANDIDATE_COLUMNS
        );
        let candidates = {
            let mut stmt = tx
                .prepare(&sql)
                .map_err(|e| StoreError::Database(e.to_string()))?;
            let rows = stmt
                .query_map(params![movie_id], Self::row_to_candidate)
                .map_err(|e| StoreError::Database(e.to_string()))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| StoreError::Database(e.to_string()))?
        };

        tx.commit().map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(candidates)
    }

    fn candidate(&self, candidate_id: &str) -> Result<Option<TrailerCandidate>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT {} FROM candidates WHERE id = ?", CANDIDATE_COLUMNS);
        conn.query_row(&sql, params![candidate_id], Self::row_to_candidate)
            .optional()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn candidates_for(
        &self,
        movie_id: i64,
        status: Option<CandidateStatus>,
    ) -> Result<Vec<TrailerCandidate>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut sql = format!("SELECT {} FROM candidates WHERE movie_id = ?", CANDIDATE_COLUMNS);
        if status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY discovered_at ASC, url ASC");

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let map_err = |e: rusqlite::Error| StoreError::Database(e.to_string());
        let rows = match status {
            Some(s) => stmt
                .query_map(params![movie_id, s.as_str()], Self::row_to_candidate)
                .map_err(map_err)?
                .collect::<Result<Vec<_>, _>>(),
            None => stmt
                .query_map(params![movie_id], Self::row_to_candidate)
                .map_err(map_err)?
                .collect::<Result<Vec<_>, _>>(),
        };

        rows.map_err(|e| StoreError::Database(e.to_string()))
    }

    fn broken_urls_for(&self, movie_id: i64) -> Result<HashSet<String>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT url FROM candidates WHERE movie_id = ? AND status = 'broken'")
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![movie_id], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;
        rows.collect::<Result<HashSet<_>, _>>()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn claim_for_download(&self, candidate_id: &str) -> Result<TrailerCandidate, StoreError> {
        let conn = self.conn.lock().unwrap();

        let updated = conn
            .execute(
                "UPDATE candidates SET status = 'downloading' WHERE id = ? AND status = 'new'",
                params![candidate_id],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if updated == 0 {
            // Either unknown or already past New; report which.
            let current = Self::get_by_id(&conn, candidate_id)?;
            return Err(StoreError::conflict(candidate_id, current.status, "claim"));
        }

        Self::get_by_id(&conn, candidate_id)
    }

    fn mark_attempt(
        &self,
        candidate_id: &str,
        outcome: AttemptOutcome,
    ) -> Result<TrailerCandidate, StoreError> {
        let conn = self.conn.lock().unwrap();

        // Existence check first so unknown ids surface as NotFound.
        let current = Self::get_by_id(&conn, candidate_id)?;
        let now = Utc::now().to_rfc3339();
        let attempts = current.attempts + 1;

        match outcome {
            AttemptOutcome::Downloaded {
                staging_path,
                metrics,
            } => {
                conn.execute(
                    "UPDATE candidates SET status = 'downloaded', staging_path = ?, \
                     width = ?, height = ?, duration_secs = ?, size_bytes = ?, \
                     attempts = ?, last_attempt_at = ?, failure_reason = NULL \
                     WHERE id = ?",
                    params![
                        staging_path.to_string_lossy(),
                        metrics.width,
                        metrics.height,
                        metrics.duration_secs,
                        metrics.size_bytes,
                        attempts,
                        now,
                        candidate_id,
                    ],
                )
            }
            AttemptOutcome::Retryable { reason } => conn.execute(
                "UPDATE candidates SET status = 'new', attempts = ?, \
                 last_attempt_at = ?, failure_reason = ? WHERE id = ?",
                params![attempts, now, reason, candidate_id],
            ),
            AttemptOutcome::Broken { reason } => conn.execute(
                "UPDATE candidates SET status = 'broken', attempts = ?, \
                 last_attempt_at = ?, failure_reason = ?, staging_path = NULL, \
                 width = NULL, height = NULL, duration_secs = NULL, size_bytes = NULL \
                 WHERE id = ?",
                params![attempts, now, reason, candidate_id],
            ),
        }
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Self::get_by_id(&conn, candidate_id)
    }

    fn record_selection(
        &self,
        movie_id: i64,
        candidate_id: &str,
        final_path: &Path,
    ) -> Result<SelectionResult, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let candidate = Self::get_by_id(&tx, candidate_id)?;
        if candidate.movie_id != movie_id || candidate.status != CandidateStatus::Downloaded {
            return Err(StoreError::conflict(candidate_id, candidate.status, "select"));
        }

        // Demote everything else first so the partial unique index never
        // sees two Selected rows for the movie.
        tx.execute(
            "UPDATE candidates SET status = 'rejected' \
             WHERE movie_id = ? AND id != ? AND status IN ('downloaded', 'selected')",
            params![movie_id, candidate_id],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.execute(
            "UPDATE candidates SET status = 'selected', final_path = ?, staging_path = NULL \
             WHERE id = ?",
            params![final_path.to_string_lossy(), candidate_id],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        let placed_at = Utc::now();
        tx.execute(
            "INSERT INTO selections (movie_id, candidate_id, final_path, placed_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(movie_id) DO UPDATE SET \
                 candidate_id = excluded.candidate_id, \
                 final_path = excluded.final_path, \
                 placed_at = excluded.placed_at",
            params![
                movie_id,
                candidate_id,
                final_path.to_string_lossy(),
                placed_at.to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.commit().map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(SelectionResult {
            movie_id,
            candidate_id: candidate_id.to_string(),
            final_path: final_path.to_path_buf(),
            placed_at,
        })
    }

    fn selection_for(&self, movie_id: i64) -> Result<Option<SelectionResult>, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT movie_id, candidate_id, final_path, placed_at \
             FROM selections WHERE movie_id = ?",
            params![movie_id],
            Self::row_to_selection,
        )
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn reset_candidate(&self, candidate_id: &str) -> Result<TrailerCandidate, StoreError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::get_by_id(&conn, candidate_id)?;
        if !current.status.can_reset() {
            return Err(StoreError::conflict(candidate_id, current.status, "reset"));
        }

        conn.execute(
            "UPDATE candidates SET status = 'new', attempts = 0, last_attempt_at = NULL, \
             failure_reason = NULL, staging_path = NULL, final_path = NULL, \
             width = NULL, height = NULL, duration_secs = NULL, size_bytes = NULL \
             WHERE id = ?",
            params![candidate_id],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Self::get_by_id(&conn, candidate_id)
    }

    fn purge_movie(&self, movie_id: i64) -> Result<u64, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let removed = tx
            .execute("DELETE FROM candidates WHERE movie_id = ?", params![movie_id])
            .map_err(|e| StoreError::Database(e.to_string()))?;
        tx.execute("DELETE FROM selections WHERE movie_id = ?", params![movie_id])
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.commit().map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(removed as u64)
    }
}
