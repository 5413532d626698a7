use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

use crate::errors::{ErrorClass, SearchError};

/// Receives per-file failures while a scan is running.
///
/// Implementations are shared by all workers, so they must tolerate calls from
/// several threads at once. A reporter only observes: whatever it does, the scan
/// carries on with the next file.
pub trait ScanReporter: Send + Sync {
    /// Called once for every file whose extraction failed
    fn file_failed(&self, path: &Path, error: &SearchError);
}

/// Logs failures through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ScanReporter for TracingReporter {
    fn file_failed(&self, path: &Path, error: &SearchError) {
        match error.class() {
            ErrorClass::Parse => warn!("Skipping unreadable document {}: {}", path.display(), error),
            _ => warn!("Failed to read {}: {}", path.display(), error),
        }
    }
}

/// A failure captured by [`CollectingReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub class: ErrorClass,
    pub message: String,
}

/// Keeps failures in memory and also logs them
#[derive(Debug, Default)]
pub struct CollectingReporter {
    failures: Mutex<Vec<FileFailure>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the failures collected so far
    pub fn take_failures(&self) -> Vec<FileFailure> {
        let mut failures = self
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *failures)
    }
}

impl ScanReporter for CollectingReporter {
    fn file_failed(&self, path: &Path, error: &SearchError) {
        TracingReporter.file_failed(path, error);
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(FileFailure {
                path: path.to_path_buf(),
                class: error.class(),
                message: error.to_string(),
            });
    }
}
