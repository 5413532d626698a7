use std::path::Path;
use tracing::trace;

use super::extractor::{
    format_for, Content, ContentExtractor, PlainTextExtractor, SpreadsheetExtractor,
};
use super::matcher::PatternMatcher;
use crate::errors::SearchResult;
use crate::metrics::ScanMetrics;
use crate::results::{FileResult, FormatKind};

/// Runs the right extractor and the matcher over a single file
#[derive(Debug)]
pub struct FileProcessor {
    matcher: PatternMatcher,
    text: PlainTextExtractor,
    spreadsheet: SpreadsheetExtractor,
    metrics: ScanMetrics,
}

impl FileProcessor {
    /// Creates a new FileProcessor with the given pattern matcher
    pub fn new(matcher: PatternMatcher, spreadsheet: SpreadsheetExtractor) -> Self {
        Self {
            matcher,
            text: PlainTextExtractor,
            spreadsheet,
            metrics: ScanMetrics::new(),
        }
    }

    /// Gets the current scan metrics
    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// The extractor responsible for `path`
    pub fn extractor_for(&self, path: &Path) -> &dyn ContentExtractor {
        match format_for(path) {
            FormatKind::Spreadsheet => &self.spreadsheet,
            FormatKind::Text => &self.text,
        }
    }

    /// Processes a file and returns its matches, or `None` when there are none.
    ///
    /// Errors are returned unrecorded; the caller decides how to report them.
    pub fn process_file(&self, path: &Path) -> SearchResult<Option<FileResult>> {
        trace!("Processing file: {}", path.display());

        let extractor = self.extractor_for(path);
        let kind = extractor.kind();
        let extracted = match extractor.extract(path) {
            Ok(extracted) => extracted,
            Err(e) => {
                self.metrics.record_failure();
                return Err(e);
            }
        };
        self.metrics.record_file_read(kind, extracted.bytes_read);

        let matches = match &extracted.content {
            Content::Text(text) => self.matcher.find_in_text(text),
            Content::Cells(cells) => self.matcher.find_in_cells(cells.iter().map(String::as_str)),
        };
        self.metrics.record_matches(matches.len());

        if matches.is_empty() {
            return Ok(None);
        }
        Ok(Some(FileResult {
            path: path.to_path_buf(),
            kind,
            matches,
        }))
    }
}
