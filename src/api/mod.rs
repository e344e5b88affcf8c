//! Lookback HTTP API
//!
//! Control and query surface for the retention engine, built with Axum.
//!
//! # Endpoints
//!
//! ## Segments
//! - `GET /api/v1/segments` - Recent segments, newest first
//! - `GET /api/v1/segments/:filename` - Single segment record
//!
//! ## Keep
//! - `POST /api/v1/keep` - Promote a window around an event instant
//!
//! ## Status
//! - `GET /api/v1/status` - Uptime, store counters, retention settings
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use lookback::api::{serve, ApiConfig, AppState};
//! use lookback::query::QueryService;
//! use lookback::retention::{RetentionConfig, RetentionPolicy};
//! use lookback::store::{SegmentStore, StoreConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(SegmentStore::open(&StoreConfig::new("./recordings"))?);
//!     let query = Arc::new(QueryService::new(Arc::clone(&store)));
//!     let policy = Arc::new(RetentionPolicy::new(store, RetentionConfig::default()));
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(query, policy, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Segment routes
        .route("/segments", get(routes::segments::list_segments))
        .route("/segments/:filename", get(routes::segments::get_segment))
        // Keep route (the promotion interface)
        .route("/keep", post(routes::keep::keep_window))
        // Status route
        .route("/status", get(routes::status::get_status));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()) // Configure properly in production
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Lookback API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Lookback API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryService;
    use crate::retention::{RetentionConfig, RetentionPolicy};
    use crate::store::{MediaType, SegmentRecord, SegmentStore, StoreConfig};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    fn create_test_app() -> (Router, std::sync::Arc<SegmentStore>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path());
        let store = Arc::new(SegmentStore::open(&config).unwrap());
        let query = Arc::new(QueryService::new(Arc::clone(&store)));
        let policy = Arc::new(RetentionPolicy::new(
            Arc::clone(&store),
            RetentionConfig::default(),
        ));

        let state = AppState::new(query, policy, ApiConfig::default());
        let router = build_router(state);

        (router, store, dir)
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _store, _dir) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let (app, _store, _dir) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let (app, _store, _dir) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_segments_newest_first() {
        let (app, store, _dir) = create_test_app();

        store
            .insert_if_absent(&SegmentRecord::new("old.mp4", MediaType::Video, 1_000))
            .unwrap();
        store
            .insert_if_absent(&SegmentRecord::new("new.mp4", MediaType::Video, 2_000))
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/segments")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["count"], 2);
        assert_eq!(json["segments"][0]["filename"], "new.mp4");
        assert_eq!(json["segments"][1]["filename"], "old.mp4");
    }

    #[tokio::test]
    async fn test_get_segment_missing_is_404() {
        let (app, _store, _dir) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/segments/absent.mp4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_keep_promotes_window() {
        let (app, store, _dir) = create_test_app();

        store
            .insert_if_absent(&SegmentRecord::new("inside.mp4", MediaType::Video, 30_000))
            .unwrap();
        store
            .insert_if_absent(&SegmentRecord::new("outside.mp4", MediaType::Video, 90_000))
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/keep")
                    .header("Content-Type", "application/json")
                    .body(Body::from(
                        r#"{"timestamp": 30000, "reason": "doorbell", "buffer_before_ms": 5000, "buffer_after_ms": 5000}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["promoted"], 1);
        assert_eq!(json["window_start"], 25_000);
        assert_eq!(json["window_end"], 35_000);

        assert!(store.get("inside.mp4").unwrap().unwrap().keep);
        assert!(!store.get("outside.mp4").unwrap().unwrap().keep);
    }

    #[tokio::test]
    async fn test_keep_extreme_timestamp_clamps_window() {
        let (app, _store, _dir) = create_test_app();

        let body = format!(r#"{{"timestamp": {}, "reason": "edge"}}"#, i64::MAX);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/keep")
                    .header("Content-Type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["promoted"], 0);
        // The window clamps at the i64 range instead of wrapping
        assert_eq!(json["window_end"], i64::MAX);
        assert!(json["window_start"].as_i64().unwrap() <= i64::MAX);
    }

    #[tokio::test]
    async fn test_keep_rejects_negative_buffer() {
        let (app, _store, _dir) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/keep")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"buffer_before_ms": -1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_keep_invalid_json() {
        let (app, _store, _dir) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/keep")
                    .header("Content-Type", "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_status_reports_retention_settings() {
        let (app, _store, _dir) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["retention"]["horizon_ms"], 600_000);
        assert_eq!(json["retention"]["buffer_before_ms"], 60_000);
    }
}
