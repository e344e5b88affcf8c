//! Keep Routes
//!
//! The promotion interface. A single POST marks every segment inside a
//! buffered window around an event instant for permanent retention.
//!
//! - POST /api/v1/keep

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{KeepRequest, KeepResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::store::now_millis;

/// Longest reason string accepted on a promotion
const MAX_REASON_LEN: usize = 256;

/// POST /api/v1/keep
///
/// Promote every segment whose timestamp falls in the inclusive window
/// `[timestamp - buffer_before, timestamp + buffer_after]`. The event
/// instant defaults to now; the buffers default to the configured
/// retention buffers. Promoting zero segments is not an error.
pub async fn keep_window(
    State(state): State<Arc<AppState>>,
    Json(req): Json<KeepRequest>,
) -> ApiResult<(StatusCode, Json<KeepResponse>)> {
    validate_keep_request(&req)?;

    let event_ms = req.timestamp.unwrap_or_else(now_millis);
    let defaults = state.policy.config();
    let before_ms = req.buffer_before_ms.unwrap_or(defaults.buffer_before_ms);
    let after_ms = req.buffer_after_ms.unwrap_or(defaults.buffer_after_ms);

    let promotion =
        state
            .policy
            .mark_with_buffers(event_ms, req.reason.as_deref(), before_ms, after_ms)?;

    Ok((
        StatusCode::OK,
        Json(KeepResponse {
            promoted: promotion.promoted,
            window_start: promotion.window.start,
            window_end: promotion.window.end,
            reason: req.reason,
        }),
    ))
}

/// Validate a keep request
fn validate_keep_request(req: &KeepRequest) -> ApiResult<()> {
    if let Some(ts) = req.timestamp {
        if ts < 0 {
            return Err(ApiError::Validation(
                "Timestamp must not be negative".to_string(),
            ));
        }
    }

    for (name, value) in [
        ("buffer_before_ms", req.buffer_before_ms),
        ("buffer_after_ms", req.buffer_after_ms),
    ] {
        if let Some(ms) = value {
            if ms < 0 {
                return Err(ApiError::Validation(format!(
                    "{} must not be negative",
                    name
                )));
            }
        }
    }

    if let Some(reason) = &req.reason {
        if reason.len() > MAX_REASON_LEN {
            return Err(ApiError::Validation(format!(
                "Reason exceeds maximum length of {} characters",
                MAX_REASON_LEN
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_keep_request_defaults() {
        assert!(validate_keep_request(&KeepRequest::default()).is_ok());
    }

    #[test]
    fn test_validate_keep_request_full() {
        let req = KeepRequest {
            timestamp: Some(1_700_000_000_000),
            reason: Some("goal scored".to_string()),
            buffer_before_ms: Some(60_000),
            buffer_after_ms: Some(30_000),
        };
        assert!(validate_keep_request(&req).is_ok());
    }

    #[test]
    fn test_validate_keep_request_negative_timestamp() {
        let req = KeepRequest {
            timestamp: Some(-1),
            ..Default::default()
        };
        assert!(validate_keep_request(&req).is_err());
    }

    #[test]
    fn test_validate_keep_request_negative_buffer() {
        let req = KeepRequest {
            buffer_after_ms: Some(-500),
            ..Default::default()
        };
        assert!(validate_keep_request(&req).is_err());
    }

    #[test]
    fn test_validate_keep_request_oversized_reason() {
        let req = KeepRequest {
            reason: Some("x".repeat(MAX_REASON_LEN + 1)),
            ..Default::default()
        };
        assert!(validate_keep_request(&req).is_err());
    }
}
