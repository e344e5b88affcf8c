//! Canonicalizing renamer for indexed producer names
//!
//! Some producers cannot name each segment after its capture time and emit
//! an indexed run instead: `YYYYMMDD_HHMMSS_NNNNN.ext`, one session prefix
//! plus a rolling five-digit counter. The renamer rewrites each such file,
//! once write-stable, to the canonical `YYYYMMDD_HHMMSS.ext` derived from
//! its mtime, so the rest of the pipeline mostly sees canonical names.
//! Renames are same-directory `fs::rename` calls; a failed attempt is
//! logged and the file stays put for a later cycle. A canonical-name
//! collision is the one failure no retry can clear (the mtime is fixed),
//! so the renamer gives the file up and the watcher registers it under
//! its original indexed name.

use crate::ingest::stability::StableFileSource;
use chrono::{DateTime, Local};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;
use tokio::sync::RwLock;

fn indexed_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{8}_\d{6}_\d{5}\.(mp4|wav)$").expect("indexed name pattern is valid")
    })
}

/// Check whether a filename is an indexed producer name
///
/// Shape only: capture token, underscore, five digits, known media
/// extension. Field ranges are not validated here; the mtime is the
/// timestamp source for these files, not the token.
pub fn is_indexed_name(filename: &str) -> bool {
    indexed_name_pattern().is_match(filename)
}

/// Canonical filename for a capture instant and extension
///
/// Formatted in local time so the timestamp resolver parses the name back
/// to the same instant.
pub fn canonical_name(modified: SystemTime, ext: &str) -> String {
    let local: DateTime<Local> = modified.into();
    format!("{}.{}", local.format("%Y%m%d_%H%M%S"), ext)
}

/// Outcome of one canonicalization attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// File does not carry an indexed producer name; nothing to do
    NotIndexed,
    /// Renamed to the canonical path
    Renamed(PathBuf),
    /// Canonical name already taken; the mtime never changes, so no retry
    /// can succeed. The file is left for the watcher to ingest as-is.
    Collision,
    /// Attempt failed; the file is left in place for a later cycle
    Failed,
}

/// Rewrites indexed producer names to canonical timestamp names
pub struct SegmentRenamer {
    running: Arc<RwLock<bool>>,
}

impl SegmentRenamer {
    pub fn new() -> Self {
        Self {
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Attempt to canonicalize one write-stable file
    pub fn canonicalize(&self, path: &Path) -> RenameOutcome {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            return RenameOutcome::NotIndexed;
        };
        if !is_indexed_name(filename) {
            return RenameOutcome::NotIndexed;
        }
        // is_indexed_name guarantees the extension is present
        let ext = filename.rsplit_once('.').map(|(_, e)| e).unwrap_or_default();

        let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                tracing::warn!("Cannot stat {} for renaming: {}", path.display(), e);
                return RenameOutcome::Failed;
            }
        };

        let target = path.with_file_name(canonical_name(modified, ext));
        if target.exists() {
            tracing::warn!(
                "Canonical name {} already taken, leaving {} for ingestion as-is",
                target.display(),
                filename
            );
            return RenameOutcome::Collision;
        }

        match std::fs::rename(path, &target) {
            Ok(()) => {
                tracing::info!("Renamed {} -> {}", filename, target.display());
                RenameOutcome::Renamed(target)
            }
            Err(e) => {
                tracing::warn!("Failed to rename {}: {}", filename, e);
                RenameOutcome::Failed
            }
        }
    }

    /// Start the renamer background task over one watched directory
    pub fn start(
        self: Arc<Self>,
        mut source: Box<dyn StableFileSource>,
    ) -> tokio::task::JoinHandle<()> {
        let renamer = self.clone();

        tokio::spawn(async move {
            *renamer.running.write().await = true;

            loop {
                let batch = match source.next_stable().await {
                    Ok(batch) => batch,
                    Err(e) => {
                        tracing::warn!("Renamer scan failed: {}", e);
                        Vec::new()
                    }
                };

                if !*renamer.running.read().await {
                    break;
                }

                for path in batch {
                    if renamer.canonicalize(&path) == RenameOutcome::Failed {
                        source.forget(&path);
                    }
                }
            }
        })
    }

    /// Stop the renamer
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }
}

impl Default for SegmentRenamer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::timestamp::parse_stem_timestamp;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_is_indexed_name() {
        assert!(is_indexed_name("20240115_143000_00001.mp4"));
        assert!(is_indexed_name("20240115_143000_99999.wav"));

        assert!(!is_indexed_name("20240115_143000.mp4")); // canonical
        assert!(!is_indexed_name("gst_00042.mp4"));
        assert!(!is_indexed_name("20240115_143000_001.mp4")); // short index
        assert!(!is_indexed_name("20240115_143000_00001.txt")); // unknown extension
        assert!(!is_indexed_name("20240115_143000_00001"));
        assert!(!is_indexed_name(""));
    }

    #[test]
    fn test_canonical_name_roundtrips_through_resolver() {
        let instant = Local.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap();
        let name = canonical_name(instant.into(), "mp4");

        assert_eq!(name, "20240115_143000.mp4");
        assert_eq!(parse_stem_timestamp(&name), Some(instant.timestamp_millis()));
    }

    #[test]
    fn test_canonicalize_renames_indexed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("20240115_143000_00001.mp4");
        std::fs::write(&path, b"segment data").unwrap();

        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
        let expected = dir.path().join(canonical_name(modified, "mp4"));

        let renamer = SegmentRenamer::new();
        assert_eq!(
            renamer.canonicalize(&path),
            RenameOutcome::Renamed(expected.clone())
        );
        assert!(!path.exists());
        assert!(expected.exists());
    }

    #[test]
    fn test_canonicalize_skips_non_indexed_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("20240115_143000.mp4");
        std::fs::write(&path, b"segment data").unwrap();

        let renamer = SegmentRenamer::new();
        assert_eq!(renamer.canonicalize(&path), RenameOutcome::NotIndexed);
        assert!(path.exists());
    }

    #[test]
    fn test_canonicalize_leaves_file_on_collision() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("20240115_143000_00001.mp4");
        std::fs::write(&path, b"segment data").unwrap();

        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
        let taken = dir.path().join(canonical_name(modified, "mp4"));
        std::fs::write(&taken, b"earlier segment").unwrap();

        let renamer = SegmentRenamer::new();
        assert_eq!(renamer.canonicalize(&path), RenameOutcome::Collision);
        assert!(path.exists());
        assert_eq!(std::fs::read(&taken).unwrap(), b"earlier segment");
    }

    #[test]
    fn test_canonicalize_missing_file_fails() {
        let dir = tempdir().unwrap();
        let renamer = SegmentRenamer::new();
        assert_eq!(
            renamer.canonicalize(&dir.path().join("20240115_143000_00001.mp4")),
            RenameOutcome::Failed
        );
    }
}
