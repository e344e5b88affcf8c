//! Status Route
//!
//! - GET /api/v1/status - Uptime, store counters, retention settings

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{RetentionSettings, StatusResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /api/v1/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> ApiResult<Json<StatusResponse>> {
    let stats = state.query.stats()?;
    let retention = state.policy.config();

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        store: stats,
        retention: RetentionSettings {
            horizon_ms: retention.horizon_ms,
            sweep_interval_ms: retention.sweep_interval_ms,
            buffer_before_ms: retention.buffer_before_ms,
            buffer_after_ms: retention.buffer_after_ms,
        },
    }))
}
