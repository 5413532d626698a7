use rayon::ThreadPoolBuilder;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use tracing::{debug, info, trace};

use super::enumerator::{enumerate, CandidateFile};
use super::extractor::SpreadsheetExtractor;
use super::matcher::PatternMatcher;
use super::processor::FileProcessor;
use super::reporter::{ScanReporter, TracingReporter};
use crate::config::SearchConfig;
use crate::errors::{SearchError, SearchResult};
use crate::filters::{ExtensionSet, IgnoreSet};
use crate::metrics::ScanMetrics;
use crate::progress::ProgressTracker;
use crate::results::{FileResult, ResultSet};

/// The fixed list of files waiting to be scanned.
///
/// The list is complete before any worker starts. Workers claim entries by
/// bumping a shared cursor, so every file is handed out exactly once and an
/// exhausted backlog stays exhausted.
#[derive(Debug)]
pub struct Backlog {
    files: Vec<CandidateFile>,
    next: AtomicUsize,
}

impl Backlog {
    pub fn new(files: Vec<CandidateFile>) -> Self {
        Self {
            files,
            next: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Claims the next unclaimed file, or `None` once all have been handed out
    pub fn next_file(&self) -> Option<&CandidateFile> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        self.files.get(index)
    }
}

/// A prepared scan: validated configuration plus the per-scan shared state.
///
/// Creating a `Scan` compiles the pattern and checks the configuration without
/// touching the file system beyond the root directory. The progress and
/// metrics handles can be cloned out before [`Scan::run`] and polled from
/// another thread while the scan is in flight.
#[derive(Debug)]
pub struct Scan {
    root: PathBuf,
    pattern: String,
    extensions: Option<ExtensionSet>,
    ignore: IgnoreSet,
    thread_count: NonZeroUsize,
    processor: FileProcessor,
    progress: ProgressTracker,
}

impl Scan {
    /// Validates `config` and prepares a scan; fails fast on an invalid or empty pattern
    pub fn new(config: &SearchConfig) -> SearchResult<Self> {
        if config.pattern.is_empty() {
            return Err(SearchError::invalid_pattern("pattern is empty"));
        }
        let matcher = PatternMatcher::with_context(&config.pattern, config.context_chars)?;
        let extensions = config.allowed_extensions()?;

        if !config.root_path.is_dir() {
            return Err(SearchError::config_error(format!(
                "search root is not a directory: {}",
                config.root_path.display()
            )));
        }

        let processor = FileProcessor::new(
            matcher,
            SpreadsheetExtractor::new(config.resolve_shared_strings),
        );

        Ok(Self {
            root: config.root_path.clone(),
            pattern: config.pattern.clone(),
            extensions,
            ignore: IgnoreSet::new(&config.ignore_patterns),
            thread_count: config.thread_count,
            processor,
            progress: ProgressTracker::new(),
        })
    }

    /// Handle for polling this scan's progress
    pub fn progress(&self) -> ProgressTracker {
        self.progress.clone()
    }

    /// Handle for reading this scan's statistics
    pub fn metrics(&self) -> ScanMetrics {
        self.processor.metrics().clone()
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count.get()
    }

    /// Runs the scan to completion, reporting per-file failures to `reporter`
    pub fn run(self, reporter: &dyn ScanReporter) -> SearchResult<ResultSet> {
        info!(
            "Starting search for '{}' in {}",
            self.pattern,
            self.root.display()
        );
        let mut result = ResultSet::new(self.pattern.as_str());

        let files = enumerate(&self.root, self.extensions.as_ref(), &self.ignore);
        self.progress.set_total(files.len());
        let backlog = Backlog::new(files);

        if backlog.is_empty() {
            debug!("No candidate files, skipping worker pool");
            return Ok(result);
        }

        let workers = self.thread_count.get();
        debug!("Scanning {} files with {} workers", backlog.len(), workers);

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("docscout-worker-{}", i))
            .build()
            .map_err(SearchError::worker_pool)?;

        let (sink, drained) = mpsc::channel::<FileResult>();
        let backlog = &backlog;
        let processor = &self.processor;
        let progress = &self.progress;

        pool.scope(|s| {
            for id in 0..workers {
                let sink = sink.clone();
                s.spawn(move |_| {
                    run_worker(id, backlog, processor, progress, reporter, sink);
                });
            }
        });
        // Every worker has returned; dropping the last sender closes the sink
        drop(sink);

        for file_result in drained {
            result.add_file_result(file_result);
        }

        self.processor.metrics().log_stats();
        info!(
            "Search complete. Found {} matches in {} files",
            result.total_matches(),
            result.files_with_matches()
        );

        Ok(result)
    }
}

/// Pulls files off the backlog until it is empty
fn run_worker(
    id: usize,
    backlog: &Backlog,
    processor: &FileProcessor,
    progress: &ProgressTracker,
    reporter: &dyn ScanReporter,
    sink: Sender<FileResult>,
) {
    trace!("Worker {} started", id);
    while let Some(file) = backlog.next_file() {
        match processor.process_file(&file.path) {
            Ok(Some(file_result)) => {
                // The receiver outlives every worker, so a send cannot fail here
                let _ = sink.send(file_result);
            }
            Ok(None) => {}
            Err(e) => reporter.file_failed(&file.path, &e),
        }
        progress.record_processed();
    }
    trace!("Worker {} finished", id);
}

/// Performs a concurrent search across files in a directory.
///
/// Same validation as [`Scan::new`]; per-file failures are logged through `tracing`.
pub fn search(config: &SearchConfig) -> SearchResult<ResultSet> {
    Scan::new(config)?.run(&TracingReporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::reporter::CollectingReporter;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_backlog_hands_out_each_file_once() {
        let files: Vec<CandidateFile> = (0..1000)
            .map(|i| CandidateFile::new(format!("file_{}.txt", i)))
            .collect();
        let backlog = Arc::new(Backlog::new(files));

        let claimed: Vec<Vec<PathBuf>> = thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let backlog = Arc::clone(&backlog);
                    s.spawn(move || {
                        let mut mine = Vec::new();
                        while let Some(file) = backlog.next_file() {
                            mine.push(file.path.clone());
                        }
                        mine
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let all: Vec<PathBuf> = claimed.into_iter().flatten().collect();
        assert_eq!(all.len(), 1000);
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), 1000);
        assert!(backlog.next_file().is_none());
    }

    #[test]
    fn test_search_with_progress() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "test line\ntest line 2\n").unwrap();
        std::fs::write(dir.path().join("b.txt"), "nothing here\n").unwrap();

        let config = SearchConfig {
            thread_count: NonZeroUsize::new(1).unwrap(),
            ..SearchConfig::new(dir.path(), "TEST")
        };
        let scan = Scan::new(&config).unwrap();
        let progress = scan.progress();
        let metrics = scan.metrics();

        let result = scan.run(&TracingReporter).unwrap();
        assert_eq!(result.pattern, "TEST");
        assert_eq!(result.files_with_matches(), 1);
        assert_eq!(result.total_matches(), 2);

        let snapshot = progress.snapshot();
        assert_eq!(snapshot.total, 2);
        assert_eq!(snapshot.processed, 2);
        assert!(snapshot.is_finished());
        assert_eq!(metrics.get_stats().files_read(), 2);
    }

    #[test]
    fn test_invalid_pattern_fails_before_io() {
        let config = SearchConfig::new("/this/root/does/not/exist", "(unclosed");
        let err = Scan::new(&config).unwrap_err();
        assert!(matches!(err, SearchError::InvalidPattern(_)));
    }

    #[test]
    fn test_missing_root_is_a_config_error() {
        let config = SearchConfig::new("/this/root/does/not/exist", "x");
        let err = Scan::new(&config).unwrap_err();
        assert!(matches!(err, SearchError::ConfigError(_)));
    }

    #[test]
    fn test_empty_pattern_is_rejected_by_both_entry_points() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "anything").unwrap();
        let config = SearchConfig::new(dir.path(), "");

        let err = Scan::new(&config).unwrap_err();
        assert!(matches!(err, SearchError::InvalidPattern(_)));

        let err = search(&config).unwrap_err();
        assert!(matches!(err, SearchError::InvalidPattern(_)));
    }

    #[test]
    fn test_file_removed_after_enumeration_is_an_access_failure() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("kept.txt"), "needle").unwrap();
        std::fs::write(dir.path().join("gone.txt"), "needle").unwrap();

        let files = enumerate(dir.path(), None, &IgnoreSet::default());
        assert_eq!(files.len(), 2);
        std::fs::remove_file(dir.path().join("gone.txt")).unwrap();

        let backlog = Backlog::new(files);
        let processor = FileProcessor::new(
            PatternMatcher::new("needle").unwrap(),
            SpreadsheetExtractor::default(),
        );
        let progress = ProgressTracker::new();
        progress.set_total(backlog.len());
        let reporter = CollectingReporter::new();
        let (sink, drained) = mpsc::channel();

        run_worker(0, &backlog, &processor, &progress, &reporter, sink);

        let results: Vec<FileResult> = drained.into_iter().collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path, dir.path().join("kept.txt"));

        let failures = reporter.take_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, dir.path().join("gone.txt"));
        assert_eq!(failures[0].class, crate::ErrorClass::Access);

        assert!(progress.snapshot().is_finished());
        assert_eq!(processor.metrics().get_stats().files_failed, 1);
    }

    #[test]
    fn test_failures_reach_reporter() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("broken.xlsx"), "needle").unwrap();
        std::fs::write(dir.path().join("fine.txt"), "needle").unwrap();

        let reporter = CollectingReporter::new();
        let result = Scan::new(&SearchConfig::new(dir.path(), "needle"))
            .unwrap()
            .run(&reporter)
            .unwrap();

        assert_eq!(result.files_with_matches(), 1);
        assert_eq!(result.file_results[0].path, dir.path().join("fine.txt"));

        let failures = reporter.take_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, dir.path().join("broken.xlsx"));
    }
}
