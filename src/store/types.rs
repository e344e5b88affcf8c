//! Core data types for the segment metadata store
//!
//! This module defines the fundamental types used throughout the retention
//! engine:
//! - `SegmentRecord`: One tracked media segment file
//! - `MediaType`: Which capture stream a segment belongs to
//! - `KeepWindow`: A closed time interval marked for permanent retention
//! - `StoreStats`: Aggregate counters over the store

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which capture stream a segment belongs to
///
/// The media type decides which directory owns the file and which
/// extension producers use for it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Video segments (.mp4) under the segments directory
    Video,
    /// Audio segments (.wav) under the audio directory
    Audio,
}

impl MediaType {
    /// Get all media types for iteration
    pub fn all() -> &'static [MediaType] {
        &[MediaType::Video, MediaType::Audio]
    }

    /// Tag stored in the database column
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::Audio => "audio",
        }
    }

    /// Parse the database column tag back into a media type
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "video" => Some(MediaType::Video),
            "audio" => Some(MediaType::Audio),
            _ => None,
        }
    }

    /// Directory name owning this media type, relative to the data dir
    pub fn subdir(&self) -> &'static str {
        match self {
            MediaType::Video => "segments",
            MediaType::Audio => "audio",
        }
    }

    /// Classify a file by extension, if it is a known segment kind
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "mp4" => Some(MediaType::Video),
            "wav" => Some(MediaType::Audio),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One tracked media segment file
///
/// The filename (name only, no directory) is the primary key. The
/// timestamp is the capture instant in epoch milliseconds and never
/// changes after insert. `keep` only ever goes from false to true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentRecord {
    /// File name within its media directory, primary key
    pub filename: String,
    /// Capture stream this segment belongs to
    pub media_type: MediaType,
    /// Capture instant, epoch milliseconds
    pub timestamp: i64,
    /// Whether this segment is permanently retained
    #[serde(default)]
    pub keep: bool,
    /// Why it is retained, if it is
    #[serde(default)]
    pub reason: Option<String>,
}

impl SegmentRecord {
    /// Create a new unkept record
    pub fn new(filename: impl Into<String>, media_type: MediaType, timestamp: i64) -> Self {
        Self {
            filename: filename.into(),
            media_type,
            timestamp,
            keep: false,
            reason: None,
        }
    }

    /// Builder method: mark as kept with a reason
    pub fn kept(mut self, reason: impl Into<String>) -> Self {
        self.keep = true;
        self.reason = Some(reason.into());
        self
    }

    /// Age of this segment relative to a reference instant, in milliseconds
    pub fn age_millis(&self, now_ms: i64) -> i64 {
        now_ms - self.timestamp
    }
}

/// A closed time interval marked for permanent retention
///
/// Both ends are inclusive: a segment timestamped exactly at `start` or
/// exactly at `end` falls inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepWindow {
    /// Start timestamp (inclusive), in milliseconds
    pub start: i64,
    /// End timestamp (inclusive), in milliseconds
    pub end: i64,
}

impl KeepWindow {
    /// Create a new keep window
    ///
    /// # Panics
    /// Panics if start > end
    pub fn new(start: i64, end: i64) -> Self {
        assert!(start <= end, "KeepWindow: start must not be greater than end");
        Self { start, end }
    }

    /// Create a keep window, returning None if invalid
    pub fn try_new(start: i64, end: i64) -> Option<Self> {
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Window surrounding an event instant with buffers on both sides
    ///
    /// Saturates at the i64 range so an event instant near the epoch
    /// extremes yields a clamped window instead of wrapping.
    pub fn around(event_ms: i64, before_ms: i64, after_ms: i64) -> Self {
        Self {
            start: event_ms.saturating_sub(before_ms),
            end: event_ms.saturating_add(after_ms),
        }
    }

    /// Check if a timestamp falls within this window (both ends inclusive)
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// Get the covered span in milliseconds
    pub fn duration_millis(&self) -> i64 {
        self.end - self.start
    }
}

/// Aggregate counters over the store
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StoreStats {
    /// Total tracked segments
    pub total_segments: u64,
    /// Segments marked for permanent retention
    pub kept_segments: u64,
    /// Oldest tracked capture instant, if any
    pub oldest_timestamp: Option<i64>,
    /// Newest tracked capture instant, if any
    pub newest_timestamp: Option<i64>,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} segments ({} kept), span {:?}..{:?}",
            self.total_segments, self.kept_segments, self.oldest_timestamp, self.newest_timestamp
        )
    }
}

/// Current instant in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
