//! Keep-window promotion
//!
//! Trigger producers report that something interesting happened near an
//! instant; the policy turns that instant into the inclusive window around
//! it and promotes every tracked segment inside. Overlapping promotions are
//! individually safe: keep is idempotent and the newest reason wins.

use crate::store::{KeepWindow, SegmentStore, StoreResult};
use std::sync::Arc;

/// Buffer and horizon settings for retention decisions
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    /// Maximum age of an unkept segment before eviction, in ms
    pub horizon_ms: i64,
    /// Time between eviction passes, in ms
    pub sweep_interval_ms: u64,
    /// Default window reach before a trigger instant, in ms
    pub buffer_before_ms: i64,
    /// Default window reach after a trigger instant, in ms
    pub buffer_after_ms: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            horizon_ms: 600_000,
            sweep_interval_ms: 60_000,
            buffer_before_ms: 60_000,
            buffer_after_ms: 30_000,
        }
    }
}

/// Result of one promotion call
#[derive(Debug, Clone)]
pub struct Promotion {
    /// The window that was promoted
    pub window: KeepWindow,
    /// How many tracked segments it covered
    pub promoted: u64,
}

/// Promotes keep windows around trigger instants
pub struct RetentionPolicy {
    store: Arc<SegmentStore>,
    config: RetentionConfig,
}

impl RetentionPolicy {
    pub fn new(store: Arc<SegmentStore>, config: RetentionConfig) -> Self {
        Self { store, config }
    }

    /// Promote the default window around a trigger instant
    pub fn mark_for_keeping(&self, event_ms: i64, reason: Option<&str>) -> StoreResult<Promotion> {
        self.mark_with_buffers(
            event_ms,
            reason,
            self.config.buffer_before_ms,
            self.config.buffer_after_ms,
        )
    }

    /// Promote with explicit buffers around the trigger instant
    pub fn mark_with_buffers(
        &self,
        event_ms: i64,
        reason: Option<&str>,
        before_ms: i64,
        after_ms: i64,
    ) -> StoreResult<Promotion> {
        let window = KeepWindow::around(event_ms, before_ms, after_ms);
        let promoted = self.store.promote_window(window, reason)?;

        tracing::info!(
            "Promoted {} segments in [{}, {}] ({})",
            promoted,
            window.start,
            window.end,
            reason.unwrap_or("no reason")
        );

        Ok(Promotion { window, promoted })
    }

    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MediaType, SegmentRecord, StoreConfig};
    use tempfile::{tempdir, TempDir};

    fn create_test_policy() -> (RetentionPolicy, Arc<SegmentStore>, TempDir) {
        let dir = tempdir().unwrap();
        let store = Arc::new(SegmentStore::open(&StoreConfig::new(dir.path())).unwrap());
        let policy = RetentionPolicy::new(store.clone(), RetentionConfig::default());
        (policy, store, dir)
    }

    fn insert(store: &SegmentStore, filename: &str, timestamp: i64) {
        store
            .insert_if_absent(&SegmentRecord::new(filename, MediaType::Video, timestamp))
            .unwrap();
    }

    #[test]
    fn test_windowing_marks_only_covered_segments() {
        let (policy, store, _dir) = create_test_policy();

        // Segments at t=0s, t=30s, t=60s; trigger at 30s with 5s buffers
        insert(&store, "t0.mp4", 0);
        insert(&store, "t30.mp4", 30_000);
        insert(&store, "t60.mp4", 60_000);

        let promotion = policy
            .mark_with_buffers(30_000, Some("trigger"), 5_000, 5_000)
            .unwrap();

        assert_eq!(promotion.window, KeepWindow::new(25_000, 35_000));
        assert_eq!(promotion.promoted, 1);
        assert!(!store.get("t0.mp4").unwrap().unwrap().keep);
        assert!(store.get("t30.mp4").unwrap().unwrap().keep);
        assert!(!store.get("t60.mp4").unwrap().unwrap().keep);
    }

    #[test]
    fn test_default_buffers() {
        let (policy, store, _dir) = create_test_policy();
        insert(&store, "early.mp4", 40_000);
        insert(&store, "late.mp4", 130_000);
        insert(&store, "outside.mp4", 130_001);

        let promotion = policy.mark_for_keeping(100_000, Some("speech")).unwrap();

        // 60s before, 30s after, both ends inclusive
        assert_eq!(promotion.window, KeepWindow::new(40_000, 130_000));
        assert_eq!(promotion.promoted, 2);
        assert!(!store.get("outside.mp4").unwrap().unwrap().keep);
    }

    #[test]
    fn test_overlapping_promotions_newest_reason_wins() {
        let (policy, store, _dir) = create_test_policy();
        insert(&store, "a.mp4", 1_000);

        policy.mark_with_buffers(1_000, Some("motion"), 500, 500).unwrap();
        policy.mark_with_buffers(1_200, Some("speech"), 500, 500).unwrap();

        let record = store.get("a.mp4").unwrap().unwrap();
        assert!(record.keep);
        assert_eq!(record.reason.as_deref(), Some("speech"));
    }
}
