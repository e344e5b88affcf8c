//! Data Transfer Objects
//!
//! Request and response types for the API endpoints. These types are
//! serialized/deserialized to/from JSON and shared with the CLI client.

use serde::{Deserialize, Serialize};

use crate::store::{SegmentRecord, StoreStats};

// ============================================
// SEGMENT DTOs
// ============================================

/// Query parameters for GET /api/v1/segments
#[derive(Debug, Default, Deserialize)]
pub struct RecentParams {
    /// Maximum number of segments to return, newest first
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Recent segments listing
#[derive(Debug, Serialize, Deserialize)]
pub struct SegmentListResponse {
    /// Number of segments returned
    pub count: usize,
    /// Segment records, newest first
    pub segments: Vec<SegmentRecord>,
}

// ============================================
// KEEP DTOs
// ============================================

/// Promotion request
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct KeepRequest {
    /// Event instant (ms since epoch), defaults to now
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Why the surrounding footage should be retained
    #[serde(default)]
    pub reason: Option<String>,
    /// Override for the pre-event buffer (ms)
    #[serde(default)]
    pub buffer_before_ms: Option<i64>,
    /// Override for the post-event buffer (ms)
    #[serde(default)]
    pub buffer_after_ms: Option<i64>,
}

/// Promotion response
#[derive(Debug, Serialize, Deserialize)]
pub struct KeepResponse {
    /// Number of rows promoted, including already-kept rows re-promoted
    pub promoted: u64,
    /// Keep window start (inclusive, ms)
    pub window_start: i64,
    /// Keep window end (inclusive, ms)
    pub window_end: i64,
    /// Reason recorded on the promoted rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ============================================
// STATUS DTOs
// ============================================

/// Daemon status report
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Overall status: "ok"
    pub status: String,
    /// Daemon version
    pub version: String,
    /// Seconds since startup
    pub uptime_seconds: u64,
    /// Store counters
    pub store: StoreStats,
    /// Active retention settings
    pub retention: RetentionSettings,
}

/// Retention settings as reported by /status
#[derive(Debug, Serialize, Deserialize)]
pub struct RetentionSettings {
    /// Age beyond which unkept segments are evicted (ms)
    pub horizon_ms: i64,
    /// Interval between eviction passes (ms)
    pub sweep_interval_ms: u64,
    /// Default pre-event keep buffer (ms)
    pub buffer_before_ms: i64,
    /// Default post-event keep buffer (ms)
    pub buffer_after_ms: i64,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "unhealthy"
    pub status: String,
    /// Store status: "ok" or "error"
    pub store: String,
    /// Seconds since startup
    pub uptime_seconds: u64,
    /// Daemon version
    pub version: String,
}
