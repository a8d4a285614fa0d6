use std::path::PathBuf;
use std::time::Duration;

use crate::error::ScanError;

/// The output of a completed scan.
///
/// A scan that starts always completes: everything it could not evaluate
/// sits in [`skipped`](ScanReport::skipped) rather than failing the call.
#[derive(Debug)]
pub struct ScanReport {
    /// Files whose patient tags matched the filter exactly.
    ///
    /// Each subtree's matches are contiguous; beyond that, ordering follows
    /// directory listing order and is not guaranteed.
    pub matches: Vec<PathBuf>,

    /// Paths removed from disk. Empty unless
    /// [`delete_rejects(true)`](crate::ScanBuilder::delete_rejects) was set.
    pub deleted: Vec<PathBuf>,

    /// Everything the scan could not evaluate: unlistable directories,
    /// unreadable or undecodable files, failed deletions. The subtree
    /// behind each error contributed nothing else.
    pub skipped: Vec<ScanError>,

    /// Scan performance statistics.
    pub stats: ScanStats,
}

/// Performance statistics for a completed scan.
#[derive(Debug)]
pub struct ScanStats {
    /// Number of regular files visited, whether matched, rejected, or
    /// skipped. Hidden files are not counted.
    pub files: usize,

    /// Number of directories successfully listed.
    pub dirs: usize,

    /// Wall-clock time from scan start to completion.
    pub duration: Duration,

    /// Total entries scanned per second. Convenience field equal to
    /// `(files + dirs) / duration.as_secs_f64()`, clamped to 0 on
    /// zero-duration runs.
    pub entries_per_sec: usize,
}

impl ScanStats {
    /// Compute `entries_per_sec` from raw counts and duration.
    pub(crate) fn compute(files: usize, dirs: usize, duration: Duration) -> Self {
        let total = files + dirs;
        let eps = if duration.as_secs_f64() > 0.0 {
            (total as f64 / duration.as_secs_f64()) as usize
        } else {
            0
        };
        Self {
            files,
            dirs,
            duration,
            entries_per_sec: eps,
        }
    }
}
