//! Query service
//!
//! Read-only facade over the store for the API layer and CLI. Purely
//! observational: no call here mutates anything, so consumers may poll it
//! at any rate.

use crate::store::{SegmentRecord, SegmentStore, StoreResult, StoreStats};
use std::sync::Arc;

/// Default number of segments returned when no limit is given
pub const DEFAULT_RECENT_LIMIT: u32 = 20;

/// Upper bound on a caller-supplied limit
pub const MAX_RECENT_LIMIT: u32 = 1000;

/// Read-side view of the segment store
pub struct QueryService {
    store: Arc<SegmentStore>,
}

impl QueryService {
    pub fn new(store: Arc<SegmentStore>) -> Self {
        Self { store }
    }

    /// Most recent segments, newest first
    ///
    /// A missing limit falls back to the default; an oversized one is
    /// clamped rather than rejected.
    pub fn recent(&self, limit: Option<u32>) -> StoreResult<Vec<SegmentRecord>> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT).min(MAX_RECENT_LIMIT);
        self.store.list_recent(limit)
    }

    /// Single segment lookup by filename
    pub fn get(&self, filename: &str) -> StoreResult<Option<SegmentRecord>> {
        self.store.get(filename)
    }

    /// Aggregate counters over the store
    pub fn stats(&self) -> StoreResult<StoreStats> {
        self.store.stats()
    }
}
