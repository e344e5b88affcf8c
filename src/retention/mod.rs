//! Retention policy
//!
//! Two cooperating policies over one store:
//!
//! - **policy**: event-driven promotion of keep windows around triggers
//! - **sweep**: time-driven eviction of expired, unkept segments
//!
//! A segment's fate is decided entirely by these two: promoted inside some
//! window and retained forever, or unkept past the horizon and evicted.

pub mod policy;
pub mod sweep;

// Re-export commonly used types
pub use policy::{Promotion, RetentionConfig, RetentionPolicy};
pub use sweep::{EvictionSweeper, SweepOutcome};
