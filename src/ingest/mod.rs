//! Segment ingestion
//!
//! Everything between "a producer wrote a file" and "the store tracks it":
//!
//! - **timestamp**: filename-token resolution with mtime fallback
//! - **stability**: write-stability tracking and the file source seam
//! - **renamer**: canonicalizes indexed producer names
//! - **watcher**: registers stable files in the store
//!
//! # Architecture
//!
//! ```text
//! producer ──writes──► media dir
//!                        │ poll + quiet period
//!                        ▼
//!                 StableFileSource
//!                   │          │
//!                   ▼          ▼
//!             SegmentRenamer  IngestWatcher ──insert_if_absent──► store
//!             (indexed names)  (canonical + fallback names)
//! ```

pub mod renamer;
pub mod stability;
pub mod timestamp;
pub mod watcher;

// Re-export commonly used types
pub use renamer::{canonical_name, is_indexed_name, RenameOutcome, SegmentRenamer};
pub use stability::{scan_dir, DirectoryPoller, ScanEntry, StabilityTracker, StableFileSource};
pub use timestamp::{parse_stem_timestamp, resolve_timestamp};
pub use watcher::IngestWatcher;
