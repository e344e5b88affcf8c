//! Ingestion watcher
//!
//! One watcher per media type, each consuming write-stable files from its
//! directory's source. For every stable file the watcher resolves a capture
//! timestamp and registers the segment in the store. Idempotency lives in
//! the store's insert, not here: duplicate notifications and restart
//! rescans are no-ops, and no single bad file ever stops the loop.

use crate::ingest::renamer::{canonical_name, is_indexed_name};
use crate::ingest::stability::StableFileSource;
use crate::ingest::timestamp::resolve_timestamp;
use crate::store::{MediaType, SegmentRecord, SegmentStore};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Registers newly stable segment files of one media type
pub struct IngestWatcher {
    store: Arc<SegmentStore>,
    media_type: MediaType,
    running: Arc<RwLock<bool>>,
}

impl IngestWatcher {
    pub fn new(store: Arc<SegmentStore>, media_type: MediaType) -> Self {
        Self {
            store,
            media_type,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Register one write-stable file, if it belongs to this watcher
    ///
    /// Returns true when a new record was inserted. Indexed producer names
    /// are deferred: the renamer owns them until they are canonical.
    pub fn register(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!("Skipping segment with non-UTF8 name: {}", path.display());
            return false;
        };

        if MediaType::from_extension(path) != Some(self.media_type) {
            tracing::debug!("Ignoring non-{} file {}", self.media_type, filename);
            return false;
        }

        if is_indexed_name(filename) {
            return self.register_collided_indexed(path, filename);
        }

        let timestamp = match resolve_timestamp(path) {
            Ok(timestamp) => timestamp,
            Err(e) => {
                tracing::warn!("Skipping {}: cannot resolve timestamp: {}", filename, e);
                return false;
            }
        };

        let record = SegmentRecord::new(filename, self.media_type, timestamp);
        match self.store.insert_if_absent(&record) {
            Ok(true) => {
                tracing::info!(
                    "Tracking {} segment {} @ {}",
                    self.media_type,
                    filename,
                    timestamp
                );
                true
            }
            Ok(false) => {
                tracing::debug!("Segment {} already tracked", filename);
                false
            }
            Err(e) => {
                tracing::error!("Failed to register segment {}: {}", filename, e);
                false
            }
        }
    }

    /// Register an indexed producer file whose canonical name is taken
    ///
    /// Indexed names belong to the renamer until canonicalized. The one
    /// exception is a canonical-name collision: the rename can never
    /// succeed (the mtime is fixed), and an untracked file would sit
    /// outside retention forever. Such a file is tracked under its
    /// original name with its mtime as the capture instant.
    fn register_collided_indexed(&self, path: &Path, filename: &str) -> bool {
        let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                tracing::warn!("Skipping {}: cannot stat: {}", filename, e);
                return false;
            }
        };

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        if !path.with_file_name(canonical_name(modified, ext)).exists() {
            tracing::debug!("Deferring indexed segment {} to the renamer", filename);
            return false;
        }

        let timestamp = DateTime::<Utc>::from(modified).timestamp_millis();
        let record = SegmentRecord::new(filename, self.media_type, timestamp);
        match self.store.insert_if_absent(&record) {
            Ok(true) => {
                tracing::info!(
                    "Canonical name for {} already taken, tracking it as-is @ {}",
                    filename,
                    timestamp
                );
                true
            }
            Ok(false) => false,
            Err(e) => {
                tracing::error!("Failed to register segment {}: {}", filename, e);
                false
            }
        }
    }

    /// Start the watcher background task over its directory source
    pub fn start(
        self: Arc<Self>,
        mut source: Box<dyn StableFileSource>,
    ) -> tokio::task::JoinHandle<()> {
        let watcher = self.clone();

        tokio::spawn(async move {
            *watcher.running.write().await = true;

            loop {
                let batch = match source.next_stable().await {
                    Ok(batch) => batch,
                    Err(e) => {
                        tracing::warn!("{} watcher scan failed: {}", watcher.media_type, e);
                        Vec::new()
                    }
                };

                if !*watcher.running.read().await {
                    break;
                }

                for path in batch {
                    watcher.register(&path);
                }
            }
        })
    }

    /// Stop the watcher
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }
}
