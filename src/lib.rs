//! # Lookback
//!
//! Rolling segment retention engine for continuous capture pipelines.
//! Recorder processes drop short media files into watched directories;
//! Lookback indexes each one, keeps a sliding window of recent history,
//! and permanently retains any segment inside a promoted window around
//! an interesting moment. Everything else is evicted on a periodic sweep.
//!
//! ## Modules
//!
//! - [`store`]: SQLite-backed segment metadata store
//! - [`ingest`]: Timestamp resolution, write-stability tracking, renaming,
//!   and directory watching
//! - [`retention`]: Keep-window promotion and the eviction sweep
//! - [`query`]: Read-side facade for the API and CLI
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML file + environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lookback::retention::{EvictionSweeper, RetentionConfig, RetentionPolicy};
//! use lookback::store::{SegmentStore, StoreConfig};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Open the store under the data directory
//!     let layout = StoreConfig::new("./recordings");
//!     layout.prepare()?;
//!     let store = Arc::new(SegmentStore::open(&layout)?);
//!
//!     let retention = RetentionConfig::default();
//!
//!     // Keep a minute of footage around an interesting moment
//!     let policy = RetentionPolicy::new(Arc::clone(&store), retention.clone());
//!     let promotion = policy.mark_for_keeping(1705329000000, Some("doorbell"))?;
//!     println!("kept {} segments", promotion.promoted);
//!
//!     // Evict everything older than the horizon that nothing kept
//!     let sweeper = EvictionSweeper::new(store, layout, &retention);
//!     let outcome = sweeper.run_once()?;
//!     println!("{}", outcome);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod ingest;
pub mod query;
pub mod retention;
pub mod store;

// Re-export top-level types for convenience
pub use store::{
    now_millis, KeepWindow, MediaType, SegmentRecord, SegmentStore, StoreConfig, StoreError,
    StoreResult, StoreStats,
};

pub use ingest::{
    canonical_name, is_indexed_name, parse_stem_timestamp, resolve_timestamp, DirectoryPoller,
    IngestWatcher, SegmentRenamer, StabilityTracker, StableFileSource,
};

pub use retention::{EvictionSweeper, Promotion, RetentionPolicy, SweepOutcome};

pub use query::QueryService;

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig};
