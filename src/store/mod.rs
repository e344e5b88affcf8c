//! Segment metadata store
//!
//! This module provides the persistent record of every tracked segment:
//!
//! - **types**: Core data structures (SegmentRecord, MediaType, KeepWindow)
//! - **segments**: SQLite-backed store, the single serialization point
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Writers:
//!   Watcher ──insert_if_absent──┐
//!   Keep API ──promote_window───┼──► Mutex<Connection> ──► lookback.db
//!   Sweeper ──select / delete───┘
//!
//! Readers:
//!   Query Service ──list_recent / stats──► same connection
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use lookback::store::{KeepWindow, MediaType, SegmentRecord, SegmentStore, StoreConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::new("./recordings");
//!     let store = SegmentStore::open(&config)?;
//!
//!     // Register a freshly captured segment
//!     store.insert_if_absent(&SegmentRecord::new(
//!         "20240115_143000.mp4",
//!         MediaType::Video,
//!         1705329000000,
//!     ))?;
//!
//!     // Keep everything around an interesting moment
//!     let window = KeepWindow::around(1705329000000, 60_000, 30_000);
//!     let promoted = store.promote_window(window, Some("doorbell"))?;
//!     println!("promoted {} segments", promoted);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod segments;
pub mod types;

// Re-export commonly used types
pub use error::{StoreError, StoreResult};
pub use segments::{SegmentStore, StoreConfig};
pub use types::{now_millis, KeepWindow, MediaType, SegmentRecord, StoreStats};
