//! Segment metadata store - SQLite-backed table of tracked segments
//!
//! One row per media file on disk. The store is the single serialization
//! point between the three writers (ingestion, promotion, eviction); every
//! operation is one short statement under the connection mutex, and nothing
//! awaits while the lock is held.
//!
//! # Row lifecycle
//!
//! ```text
//! insert_if_absent (unkept) ──► promote_window (keep = 1, any number of times)
//!        │
//!        └──► delete_if_still_unkept (only while keep = 0 and expired)
//! ```

use crate::store::error::{StoreError, StoreResult};
use crate::store::types::{KeepWindow, MediaType, SegmentRecord, StoreStats};
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Data directory layout
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory holding the media subdirectories and the database
    pub data_dir: PathBuf,
}

impl StoreConfig {
    /// Create a config rooted at the given directory
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path of the SQLite database file
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("lookback.db")
    }

    /// Directory owning segments of the given media type
    pub fn media_dir(&self, media_type: MediaType) -> PathBuf {
        self.data_dir.join(media_type.subdir())
    }

    /// Video segment directory
    pub fn video_dir(&self) -> PathBuf {
        self.media_dir(MediaType::Video)
    }

    /// Audio segment directory
    pub fn audio_dir(&self) -> PathBuf {
        self.media_dir(MediaType::Audio)
    }

    /// Create the directory tree if missing
    pub fn prepare(&self) -> std::io::Result<()> {
        for media_type in MediaType::all() {
            std::fs::create_dir_all(self.media_dir(*media_type))?;
        }
        Ok(())
    }
}

/// SQLite-backed segment metadata store
///
/// Holds exactly one connection. (std::sync::Mutex because the connection
/// is !Sync; each method releases the lock before returning.)
pub struct SegmentStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl SegmentStore {
    /// Create or open the store under the configured data directory
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let path = config.db_path();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        // Configure for performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = 10000;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS segments (
                filename   TEXT PRIMARY KEY,
                media_type TEXT NOT NULL,
                timestamp  INTEGER NOT NULL,
                keep       INTEGER NOT NULL DEFAULT 0,
                reason     TEXT
            )",
            [],
        )?;

        // Index on timestamp for window promotion and expiry scans
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_segments_timestamp ON segments(timestamp)",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(format!("segment store mutex poisoned: {}", e)))
    }

    /// Register a segment unless its filename is already tracked
    ///
    /// Returns true if a new row was inserted. Re-observing a known
    /// filename is a no-op, so watcher restarts and rescans are harmless.
    pub fn insert_if_absent(&self, record: &SegmentRecord) -> StoreResult<bool> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "INSERT OR IGNORE INTO segments (filename, media_type, timestamp, keep, reason)
             VALUES (?, ?, ?, ?, ?)",
        )?;
        let inserted = stmt.execute(params![
            record.filename,
            record.media_type.as_str(),
            record.timestamp,
            record.keep,
            record.reason,
        ])?;
        Ok(inserted > 0)
    }

    /// Mark every segment inside the window as kept
    ///
    /// One statement over the inclusive range, so a concurrent sweep can
    /// never observe a half-applied window. The reason overwrites any
    /// previous one; keep never goes back to false.
    pub fn promote_window(&self, window: KeepWindow, reason: Option<&str>) -> StoreResult<u64> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE segments SET keep = 1, reason = ?
             WHERE timestamp >= ? AND timestamp <= ?",
            params![reason, window.start, window.end],
        )?;
        Ok(updated as u64)
    }

    /// Segments strictly older than the cutoff that nothing has kept
    ///
    /// A segment timestamped exactly at the cutoff is not returned.
    pub fn select_expired_unkept(&self, cutoff_ms: i64) -> StoreResult<Vec<SegmentRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT filename, media_type, timestamp, keep, reason FROM segments
             WHERE timestamp < ? AND keep = 0
             ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map(params![cutoff_ms], row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Delete a row only if it is still unkept
    ///
    /// Re-checks keep at delete time, closing the race between a sweep's
    /// selection and its deletion: a promotion landing in between flips
    /// keep and this statement matches nothing.
    pub fn delete_if_still_unkept(&self, filename: &str) -> StoreResult<bool> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached("DELETE FROM segments WHERE filename = ? AND keep = 0")?;
        let deleted = stmt.execute(params![filename])?;
        Ok(deleted > 0)
    }

    /// Most recent segments, newest first
    pub fn list_recent(&self, limit: u32) -> StoreResult<Vec<SegmentRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT filename, media_type, timestamp, keep, reason FROM segments
             ORDER BY timestamp DESC
             LIMIT ?",
        )?;
        let rows = stmt.query_map(params![limit], row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Look up a single segment by filename
    pub fn get(&self, filename: &str) -> StoreResult<Option<SegmentRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT filename, media_type, timestamp, keep, reason FROM segments
             WHERE filename = ?",
        )?;
        match stmt.query_row(params![filename], row_to_record) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Aggregate counters over the store
    pub fn stats(&self) -> StoreResult<StoreStats> {
        let conn = self.lock()?;
        let stats = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(keep), 0), MIN(timestamp), MAX(timestamp)
             FROM segments",
            [],
            |row| {
                Ok(StoreStats {
                    total_segments: row.get::<_, i64>(0)? as u64,
                    kept_segments: row.get::<_, i64>(1)? as u64,
                    oldest_timestamp: row.get(2)?,
                    newest_timestamp: row.get(3)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Force checkpoint for WAL mode
    pub fn checkpoint(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<SegmentRecord> {
    let media_raw: String = row.get(1)?;
    let media_type = MediaType::parse(&media_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown media type: {}", media_raw).into(),
        )
    })?;

    Ok(SegmentRecord {
        filename: row.get(0)?,
        media_type,
        timestamp: row.get(2)?,
        keep: row.get(3)?,
        reason: row.get(4)?,
    })
}
