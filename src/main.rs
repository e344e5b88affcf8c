//! Lookback daemon
//!
//! Run with: cargo run --bin lookback
//!
//! Wires the full retention engine together: the segment store, one
//! ingestion watcher per media type, the canonicalizing renamer, the
//! eviction sweeper, and the HTTP API. Configuration comes from a TOML
//! file with `LOOKBACK_*` environment overrides; see `lookback-cli config`
//! for a commented template.

use anyhow::Context;
use lookback::api::{serve, ApiConfig, AppState};
use lookback::config::Config;
use lookback::ingest::{DirectoryPoller, IngestWatcher, SegmentRenamer};
use lookback::query::QueryService;
use lookback::retention::{EvictionSweeper, RetentionConfig, RetentionPolicy};
use lookback::store::{MediaType, SegmentStore, StoreConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();

    init_tracing(&config);

    tracing::info!("Starting Lookback v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {}", config.storage.data_dir);

    // Prepare the directory layout and open the store
    let layout = StoreConfig::new(&config.storage.data_dir);
    layout
        .prepare()
        .with_context(|| format!("cannot create data directory {:?}", layout.data_dir))?;
    let store = Arc::new(SegmentStore::open(&layout).context("cannot open segment store")?);
    tracing::info!("Segment store ready at {:?}", store.path());

    let retention = RetentionConfig {
        horizon_ms: config.retention.horizon_secs as i64 * 1000,
        sweep_interval_ms: config.retention.sweep_interval_secs * 1000,
        buffer_before_ms: config.retention.buffer_before_ms as i64,
        buffer_after_ms: config.retention.buffer_after_ms as i64,
    };
    tracing::info!(
        "Retention: horizon {}s, sweep every {}s, keep buffers -{}ms/+{}ms",
        config.retention.horizon_secs,
        config.retention.sweep_interval_secs,
        retention.buffer_before_ms,
        retention.buffer_after_ms
    );

    let poll_interval = Duration::from_millis(config.ingest.poll_interval_ms);
    let quiet_period = Duration::from_millis(config.ingest.quiet_period_ms);

    // One watcher and one renamer source per media directory
    let mut watchers = Vec::new();
    let mut handles = Vec::new();

    let renamer = Arc::new(SegmentRenamer::new());
    for media_type in MediaType::all() {
        let dir = layout.media_dir(*media_type);

        let watcher = Arc::new(IngestWatcher::new(Arc::clone(&store), *media_type));
        let source = DirectoryPoller::new(dir.clone(), poll_interval, quiet_period);
        handles.push(Arc::clone(&watcher).start(Box::new(source)));
        watchers.push(watcher);

        let source = DirectoryPoller::new(dir.clone(), poll_interval, quiet_period);
        handles.push(Arc::clone(&renamer).start(Box::new(source)));

        tracing::info!("Watching {} directory {:?}", media_type, dir);
    }

    // Eviction sweeper
    let sweeper = Arc::new(EvictionSweeper::new(
        Arc::clone(&store),
        layout.clone(),
        &retention,
    ));
    handles.push(Arc::clone(&sweeper).start());

    // HTTP API
    let api_config = ApiConfig::new(config.api.host.clone(), config.api.port);
    let query = Arc::new(QueryService::new(Arc::clone(&store)));
    let policy = Arc::new(RetentionPolicy::new(Arc::clone(&store), retention));
    let state = AppState::new(query, policy, api_config.clone());

    // Blocks until a shutdown signal arrives
    serve(state, &api_config).await?;

    // Stop background tasks, let in-flight store calls finish
    tracing::info!("Stopping background tasks...");
    for watcher in &watchers {
        watcher.stop().await;
    }
    renamer.stop().await;
    sweeper.stop().await;
    for handle in handles {
        handle.abort();
    }

    if let Err(e) = store.checkpoint() {
        tracing::warn!("Final checkpoint failed: {}", e);
    }

    tracing::info!("Lookback shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber from the logging config
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_env("LOOKBACK_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(format!(
                "lookback={},tower_http=warn",
                config.logging.level
            ))
        });

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
