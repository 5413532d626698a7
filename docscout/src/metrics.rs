use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::results::FormatKind;
use crate::search::extractor::{LARGE_FILE_THRESHOLD, SMALL_FILE_THRESHOLD};

/// Tracks per-scan processing statistics
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    // Bytes read from disk (or mapped)
    bytes_read: Arc<AtomicU64>,

    // Read strategy for plain text files
    small_files_processed: Arc<AtomicU64>,
    buffered_files_processed: Arc<AtomicU64>,
    mmap_files_processed: Arc<AtomicU64>,

    // Outcome counters
    spreadsheets_processed: Arc<AtomicU64>,
    files_failed: Arc<AtomicU64>,
    files_with_matches: Arc<AtomicU64>,
    matches_found: Arc<AtomicU64>,
}

impl ScanMetrics {
    /// Creates a new ScanMetrics instance
    pub fn new() -> Self {
        Self {
            bytes_read: Arc::new(AtomicU64::new(0)),
            small_files_processed: Arc::new(AtomicU64::new(0)),
            buffered_files_processed: Arc::new(AtomicU64::new(0)),
            mmap_files_processed: Arc::new(AtomicU64::new(0)),
            spreadsheets_processed: Arc::new(AtomicU64::new(0)),
            files_failed: Arc::new(AtomicU64::new(0)),
            files_with_matches: Arc::new(AtomicU64::new(0)),
            matches_found: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a file read, classified by format and size
    pub fn record_file_read(&self, kind: FormatKind, size: u64) {
        self.bytes_read.fetch_add(size, Ordering::Relaxed);
        match kind {
            FormatKind::Spreadsheet => {
                self.spreadsheets_processed.fetch_add(1, Ordering::Relaxed);
            }
            FormatKind::Text if size < SMALL_FILE_THRESHOLD => {
                self.small_files_processed.fetch_add(1, Ordering::Relaxed);
            }
            FormatKind::Text if size >= LARGE_FILE_THRESHOLD => {
                self.mmap_files_processed.fetch_add(1, Ordering::Relaxed);
            }
            FormatKind::Text => {
                self.buffered_files_processed
                    .fetch_add(1, Ordering::Relaxed);
            }
        }
        debug!("Read {} bytes as {:?}", size, kind);
    }

    /// Records a file whose extraction failed
    pub fn record_failure(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file that produced `count` matches
    pub fn record_matches(&self, count: usize) {
        if count > 0 {
            self.files_with_matches.fetch_add(1, Ordering::Relaxed);
            self.matches_found
                .fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    /// Gets current scan statistics
    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            small_files: self.small_files_processed.load(Ordering::Relaxed),
            buffered_files: self.buffered_files_processed.load(Ordering::Relaxed),
            mmap_files: self.mmap_files_processed.load(Ordering::Relaxed),
            spreadsheets: self.spreadsheets_processed.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            files_with_matches: self.files_with_matches.load(Ordering::Relaxed),
            matches_found: self.matches_found.load(Ordering::Relaxed),
        }
    }

    /// Logs current scan statistics
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Bytes read: {}\n\
             Text files (small/buffered/mmap): {}/{}/{}\n\
             Spreadsheets: {}\n\
             Failed files: {}\n\
             Matches: {} in {} files",
            stats.bytes_read,
            stats.small_files,
            stats.buffered_files,
            stats.mmap_files,
            stats.spreadsheets,
            stats.files_failed,
            stats.matches_found,
            stats.files_with_matches
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub bytes_read: u64,
    pub small_files: u64,
    pub buffered_files: u64,
    pub mmap_files: u64,
    pub spreadsheets: u64,
    pub files_failed: u64,
    pub files_with_matches: u64,
    pub matches_found: u64,
}

impl ScanStats {
    /// Files that were read successfully, whatever their format
    pub fn files_read(&self) -> u64 {
        self.small_files + self.buffered_files + self.mmap_files + self.spreadsheets
    }
}
