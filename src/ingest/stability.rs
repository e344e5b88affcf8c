//! Write-stability tracking for watched directories
//!
//! Recorder processes write segment files incrementally; acting on a file
//! while its writer still holds it open would index half a segment. This
//! module turns raw directory scans into "this file is done being written"
//! decisions:
//!
//! - `scan_dir`: one snapshot of the regular files in a directory
//! - `StabilityTracker`: the deterministic core; consumes snapshots plus an
//!   explicit observation instant and yields each path once, after its size
//!   and mtime have held still for the quiet period
//! - `StableFileSource` / `DirectoryPoller`: the async seam the watcher and
//!   renamer consume, backed by interval polling in production

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// One file observed during a directory scan
#[derive(Debug, Clone)]
pub struct ScanEntry {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

/// List the regular files directly under a directory
///
/// Entries that vanish mid-scan or refuse metadata are skipped;
/// subdirectories are never descended into.
pub fn scan_dir(dir: &Path) -> io::Result<Vec<ScanEntry>> {
    let mut entries = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        if !metadata.is_file() {
            continue;
        }
        let modified = match metadata.modified() {
            Ok(m) => m,
            Err(_) => continue,
        };

        entries.push(ScanEntry {
            path: entry.path(),
            size: metadata.len(),
            modified,
        });
    }

    Ok(entries)
}

struct PendingFile {
    size: u64,
    modified: SystemTime,
    unchanged_since: Instant,
}

/// Decides when a file has been write-stable for the quiet period
///
/// Purely observational: every decision derives from the scans and instants
/// passed in, so tests drive the clock without sleeping. Each path is
/// yielded at most once per appearance in the directory; a path that
/// disappears and comes back starts over.
pub struct StabilityTracker {
    quiet_period: Duration,
    pending: HashMap<PathBuf, PendingFile>,
    emitted: HashSet<PathBuf>,
}

impl StabilityTracker {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: HashMap::new(),
            emitted: HashSet::new(),
        }
    }

    /// Record one directory snapshot; returns paths that just turned stable
    pub fn observe(&mut self, now: Instant, scan: &[ScanEntry]) -> Vec<PathBuf> {
        let mut ready = Vec::new();

        for entry in scan {
            if self.emitted.contains(&entry.path) {
                continue;
            }

            let pending = self
                .pending
                .entry(entry.path.clone())
                .or_insert_with(|| PendingFile {
                    size: entry.size,
                    modified: entry.modified,
                    unchanged_since: now,
                });

            if pending.size != entry.size || pending.modified != entry.modified {
                // Still being written, restart the quiet period
                pending.size = entry.size;
                pending.modified = entry.modified;
                pending.unchanged_since = now;
                continue;
            }

            if now.duration_since(pending.unchanged_since) >= self.quiet_period {
                ready.push(entry.path.clone());
            }
        }

        for path in &ready {
            self.pending.remove(path);
            self.emitted.insert(path.clone());
        }

        // Forget paths no longer present, so a reappearing file starts over
        let present: HashSet<&PathBuf> = scan.iter().map(|e| &e.path).collect();
        self.pending.retain(|path, _| present.contains(path));
        self.emitted.retain(|path| present.contains(path));

        ready
    }

    /// Number of files currently waiting out their quiet period
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Re-arm a path that was already yielded
    ///
    /// The path goes through a full quiet period again before the next
    /// emission. Consumers use this to get a failed file re-presented on a
    /// later cycle.
    pub fn forget(&mut self, path: &Path) {
        self.pending.remove(path);
        self.emitted.remove(path);
    }
}

/// Source of write-stable files from a watched directory
///
/// Implementations own the debouncing: consumers only ever see a path once
/// its writer has gone quiet.
#[async_trait]
pub trait StableFileSource: Send {
    /// Wait for the next observation cycle and return newly stable files
    async fn next_stable(&mut self) -> io::Result<Vec<PathBuf>>;

    /// Ask for a yielded path to be surfaced again on a later cycle
    fn forget(&mut self, _path: &Path) {}
}

/// Interval-polling `StableFileSource` over one directory
pub struct DirectoryPoller {
    dir: PathBuf,
    interval: tokio::time::Interval,
    tracker: StabilityTracker,
}

impl DirectoryPoller {
    pub fn new(dir: impl Into<PathBuf>, poll_interval: Duration, quiet_period: Duration) -> Self {
        Self {
            dir: dir.into(),
            interval: tokio::time::interval(poll_interval),
            tracker: StabilityTracker::new(quiet_period),
        }
    }

    /// Directory this poller watches
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl StableFileSource for DirectoryPoller {
    async fn next_stable(&mut self) -> io::Result<Vec<PathBuf>> {
        self.interval.tick().await;
        let scan = scan_dir(&self.dir)?;
        Ok(self.tracker.observe(Instant::now(), &scan))
    }

    fn forget(&mut self, path: &Path) {
        self.tracker.forget(path);
    }
}
