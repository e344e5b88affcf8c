//! Eviction sweep
//!
//! The time-driven half of retention. On each tick the sweeper computes the
//! cutoff, selects expired unkept segments, and for each one deletes the
//! metadata row first (re-checking keep at delete time) and then the file.
//! A promotion landing between selection and deletion saves the segment;
//! a file that cannot be removed stays on disk but the row is gone, so the
//! index never claims a segment eviction has released.

use crate::retention::policy::RetentionConfig;
use crate::store::{now_millis, SegmentRecord, SegmentStore, StoreConfig, StoreResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Counters from one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Candidates returned by the expiry scan
    pub selected: usize,
    /// Metadata rows actually deleted
    pub deleted_rows: usize,
    /// Files removed from disk
    pub deleted_files: usize,
    /// Candidates a concurrent promotion saved
    pub survivors: usize,
    /// File removals that failed after the row was already gone
    pub file_errors: usize,
}

impl std::fmt::Display for SweepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "evicted {}/{} candidates ({} files removed, {} survivors, {} file errors)",
            self.deleted_rows, self.selected, self.deleted_files, self.survivors, self.file_errors
        )
    }
}

/// Periodically evicts expired, unkept segments
pub struct EvictionSweeper {
    store: Arc<SegmentStore>,
    layout: StoreConfig,
    horizon_ms: i64,
    sweep_interval: Duration,
    running: Arc<RwLock<bool>>,
}

impl EvictionSweeper {
    pub fn new(store: Arc<SegmentStore>, layout: StoreConfig, config: &RetentionConfig) -> Self {
        Self {
            store,
            layout,
            horizon_ms: config.horizon_ms,
            sweep_interval: Duration::from_millis(config.sweep_interval_ms),
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Selection phase: expired unkept segments as of the cutoff
    pub fn plan(&self, cutoff_ms: i64) -> StoreResult<Vec<SegmentRecord>> {
        self.store.select_expired_unkept(cutoff_ms)
    }

    /// Deletion phase: evict previously selected candidates
    ///
    /// Each row is deleted only if still unkept; the file goes after its
    /// row, best effort.
    pub fn evict(&self, candidates: &[SegmentRecord]) -> StoreResult<SweepOutcome> {
        let mut outcome = SweepOutcome {
            selected: candidates.len(),
            ..Default::default()
        };

        for record in candidates {
            if !self.store.delete_if_still_unkept(&record.filename)? {
                outcome.survivors += 1;
                tracing::debug!("Segment {} promoted since selection, kept", record.filename);
                continue;
            }
            outcome.deleted_rows += 1;

            let path = self
                .layout
                .media_dir(record.media_type)
                .join(&record.filename);
            match std::fs::remove_file(&path) {
                Ok(()) => outcome.deleted_files += 1,
                Err(e) => {
                    outcome.file_errors += 1;
                    tracing::warn!(
                        "Evicted {} but could not remove its file: {}",
                        record.filename,
                        e
                    );
                }
            }
        }

        Ok(outcome)
    }

    /// One full pass against an explicit cutoff
    pub fn evict_older_than(&self, cutoff_ms: i64) -> StoreResult<SweepOutcome> {
        let candidates = self.plan(cutoff_ms)?;
        let outcome = self.evict(&candidates)?;

        if outcome.selected > 0 {
            tracing::info!("Sweep: {}", outcome);
        } else {
            tracing::debug!("Sweep: nothing expired");
        }

        Ok(outcome)
    }

    /// One full pass against the wall clock
    pub fn run_once(&self) -> StoreResult<SweepOutcome> {
        self.evict_older_than(now_millis() - self.horizon_ms)
    }

    /// Start the sweep timer
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let sweeper = self.clone();

        tokio::spawn(async move {
            *sweeper.running.write().await = true;

            let mut interval = tokio::time::interval(sweeper.sweep_interval);

            loop {
                interval.tick().await;

                if !*sweeper.running.read().await {
                    break;
                }

                // A failed pass logs and waits for the next tick
                if let Err(e) = sweeper.run_once() {
                    tracing::error!("Sweep pass failed: {}", e);
                }
            }
        })
    }

    /// Stop the sweep timer
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeepWindow, MediaType};
    use tempfile::{tempdir, TempDir};

    fn create_test_sweeper() -> (EvictionSweeper, Arc<SegmentStore>, StoreConfig, TempDir) {
        let dir = tempdir().unwrap();
        let layout = StoreConfig::new(dir.path());
        layout.prepare().unwrap();
        let store = Arc::new(SegmentStore::open(&layout).unwrap());
        let sweeper = EvictionSweeper::new(store.clone(), layout.clone(), &RetentionConfig::default());
        (sweeper, store, layout, dir)
    }

    fn insert_with_file(
        store: &SegmentStore,
        layout: &StoreConfig,
        filename: &str,
        media_type: MediaType,
        timestamp: i64,
    ) {
        std::fs::write(layout.media_dir(media_type).join(filename), b"segment data").unwrap();
        store
            .insert_if_absent(&SegmentRecord::new(filename, media_type, timestamp))
            .unwrap();
    }

    #[test]
    fn test_sweep_removes_expired_unkept() {
        let (sweeper, store, layout, _dir) = create_test_sweeper();
        insert_with_file(&store, &layout, "old.mp4", MediaType::Video, 1_000);
        insert_with_file(&store, &layout, "old.wav", MediaType::Audio, 2_000);

        let outcome = sweeper.evict_older_than(10_000).unwrap();

        assert_eq!(outcome.selected, 2);
        assert_eq!(outcome.deleted_rows, 2);
        assert_eq!(outcome.deleted_files, 2);
        assert_eq!(outcome.file_errors, 0);
        assert!(store.get("old.mp4").unwrap().is_none());
        assert!(!layout.video_dir().join("old.mp4").exists());
        assert!(!layout.audio_dir().join("old.wav").exists());
    }

    #[test]
    fn test_sweep_never_touches_kept_segments() {
        let (sweeper, store, layout, _dir) = create_test_sweeper();
        insert_with_file(&store, &layout, "precious.mp4", MediaType::Video, 1_000);
        store
            .promote_window(KeepWindow::new(0, 2_000), Some("manual"))
            .unwrap();

        // Far in the future, way past any horizon
        let outcome = sweeper.evict_older_than(i64::MAX).unwrap();

        assert_eq!(outcome.selected, 0);
        assert!(store.get("precious.mp4").unwrap().is_some());
        assert!(layout.video_dir().join("precious.mp4").exists());
    }

    #[test]
    fn test_sweep_spares_segments_at_the_cutoff() {
        let (sweeper, store, layout, _dir) = create_test_sweeper();
        insert_with_file(&store, &layout, "edge.mp4", MediaType::Video, 10_000);

        let outcome = sweeper.evict_older_than(10_000).unwrap();

        assert_eq!(outcome.selected, 0);
        assert!(store.get("edge.mp4").unwrap().is_some());
    }

    #[test]
    fn test_promotion_between_plan_and_evict_wins() {
        let (sweeper, store, layout, _dir) = create_test_sweeper();
        insert_with_file(&store, &layout, "saved.mp4", MediaType::Video, 1_000);
        insert_with_file(&store, &layout, "doomed.mp4", MediaType::Video, 1_500);

        let candidates = sweeper.plan(10_000).unwrap();
        assert_eq!(candidates.len(), 2);

        // Promotion lands between the two phases
        store
            .promote_window(KeepWindow::new(900, 1_100), Some("trigger"))
            .unwrap();

        let outcome = sweeper.evict(&candidates).unwrap();
        assert_eq!(outcome.survivors, 1);
        assert_eq!(outcome.deleted_rows, 1);

        assert!(store.get("saved.mp4").unwrap().unwrap().keep);
        assert!(layout.video_dir().join("saved.mp4").exists());
        assert!(store.get("doomed.mp4").unwrap().is_none());
        assert!(!layout.video_dir().join("doomed.mp4").exists());
    }

    #[test]
    fn test_missing_file_still_drops_row() {
        let (sweeper, store, _layout, _dir) = create_test_sweeper();
        // Row without a file behind it
        store
            .insert_if_absent(&SegmentRecord::new("ghost.mp4", MediaType::Video, 1_000))
            .unwrap();

        let outcome = sweeper.evict_older_than(10_000).unwrap();

        assert_eq!(outcome.deleted_rows, 1);
        assert_eq!(outcome.deleted_files, 0);
        assert_eq!(outcome.file_errors, 1);
        assert!(store.get("ghost.mp4").unwrap().is_none());
    }

    #[test]
    fn test_run_once_uses_wall_clock_horizon() {
        let (sweeper, store, layout, _dir) = create_test_sweeper();
        let now = now_millis();
        insert_with_file(&store, &layout, "stale.mp4", MediaType::Video, now - 700_000);
        insert_with_file(&store, &layout, "fresh.mp4", MediaType::Video, now - 5_000);

        let outcome = sweeper.run_once().unwrap();

        assert_eq!(outcome.deleted_rows, 1);
        assert!(store.get("stale.mp4").unwrap().is_none());
        assert!(store.get("fresh.mp4").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sweeper_task_evicts_on_schedule() {
        let dir = tempdir().unwrap();
        let layout = StoreConfig::new(dir.path());
        layout.prepare().unwrap();
        let store = Arc::new(SegmentStore::open(&layout).unwrap());

        let config = RetentionConfig {
            sweep_interval_ms: 20,
            ..Default::default()
        };
        let sweeper = Arc::new(EvictionSweeper::new(store.clone(), layout.clone(), &config));

        insert_with_file(
            &store,
            &layout,
            "stale.mp4",
            MediaType::Video,
            now_millis() - 700_000,
        );

        let handle = sweeper.clone().start();

        let mut evicted = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if store.get("stale.mp4").unwrap().is_none() {
                evicted = true;
                break;
            }
        }
        assert!(evicted);
        assert!(!layout.video_dir().join("stale.mp4").exists());

        sweeper.stop().await;
        handle.abort();
    }
}
