//! Segment Routes
//!
//! Read-side endpoints over the segment store.
//!
//! - GET /api/v1/segments - Recent segments, newest first
//! - GET /api/v1/segments/:filename - Single segment record

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{RecentParams, SegmentListResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::store::SegmentRecord;

/// GET /api/v1/segments
///
/// List recent segments, newest first. `limit` defaults to 20 and is
/// capped server-side.
pub async fn list_segments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentParams>,
) -> ApiResult<Json<SegmentListResponse>> {
    let segments = state.query.recent(params.limit)?;

    Ok(Json(SegmentListResponse {
        count: segments.len(),
        segments,
    }))
}

/// GET /api/v1/segments/:filename
///
/// Look up a single segment record by filename.
pub async fn get_segment(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> ApiResult<Json<SegmentRecord>> {
    match state.query.get(&filename)? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(format!("Segment '{}'", filename))),
    }
}
