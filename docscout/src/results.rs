//! Result types produced by a scan.
//!
//! A [`ResultSet`] is the only value that leaves the scanning core. It owns
//! everything it refers to, so it can be rendered, saved or compared long after
//! the scan that produced it has been dropped.
//!
//! The serialised form uses the short field names that saved result files
//! have always used:
//!
//! ```json
//! {
//!   "pattern": "invoice",
//!   "timestamp": "20240131_154500",
//!   "results": [
//!     {
//!       "file": "data/book.xlsx",
//!       "type": "spreadsheet",
//!       "matches": [{ "match": "INVOICE-2024", "context": "Found in cell" }]
//!     }
//!   ]
//! }
//! ```
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::{SearchError, SearchResult};

/// Which extractor produced a file's matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Text,
    Spreadsheet,
}

/// A single hit inside a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// The matched text (for spreadsheets, the whole cell value)
    #[serde(rename = "match")]
    pub matched: String,
    /// Human-readable surroundings of the match
    pub context: String,
}

/// All matches found in a single file, in scan order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResult {
    #[serde(rename = "file")]
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: FormatKind,
    pub matches: Vec<MatchRecord>,
}

/// The complete output of one scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    /// The pattern exactly as the caller supplied it
    pub pattern: String,
    /// UTC capture time, formatted `YYYYMMDD_HHMMSS`
    pub timestamp: String,
    /// Per-file results in the order workers finished them
    #[serde(rename = "results")]
    pub file_results: Vec<FileResult>,
}

impl ResultSet {
    /// Creates an empty result set stamped with the current time
    pub fn new(pattern: impl Into<String>) -> Self {
        Self::with_timestamp(pattern, capture_timestamp(SystemTime::now()))
    }

    pub fn with_timestamp(pattern: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            timestamp: timestamp.into(),
            file_results: Vec::new(),
        }
    }

    /// Adds a file result; files without matches are not recorded
    pub fn add_file_result(&mut self, file_result: FileResult) {
        if !file_result.matches.is_empty() {
            self.file_results.push(file_result);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.file_results.is_empty()
    }

    /// Total number of match records across all files
    pub fn total_matches(&self) -> usize {
        self.file_results.iter().map(|fr| fr.matches.len()).sum()
    }

    /// Number of files with at least one match
    pub fn files_with_matches(&self) -> usize {
        self.file_results.len()
    }

    /// File name used when this result set is saved
    pub fn file_name(&self) -> String {
        format!("search_results_{}.json", self.timestamp)
    }

    /// Writes the result set as pretty JSON into `dir` and returns the file path.
    ///
    /// The file is written to a temporary sibling first and renamed into place,
    /// so readers never observe a half-written result file.
    pub fn save_to_dir(&self, dir: &Path) -> SearchResult<PathBuf> {
        let target = dir.join(self.file_name());
        let tmp = NamedTempFile::new_in(dir).map_err(|e| SearchError::io_error(dir, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
        }
        tmp.persist(&target)
            .map_err(|e| SearchError::io_error(&target, e.error))?;
        debug!("Saved {} file results to {}", self.file_results.len(), target.display());
        Ok(target)
    }

    /// Reads a result set previously written by [`ResultSet::save_to_dir`]
    pub fn load(path: &Path) -> SearchResult<Self> {
        let file = File::open(path).map_err(|e| SearchError::io_error(path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Formats `time` as a UTC `YYYYMMDD_HHMMSS` stamp
pub fn capture_timestamp(time: SystemTime) -> String {
    // "2024-01-31T15:45:00Z" -> "20240131_154500"
    humantime::format_rfc3339_seconds(time)
        .to_string()
        .chars()
        .filter_map(|c| match c {
            '-' | ':' | 'Z' => None,
            'T' => Some('_'),
            c => Some(c),
        })
        .collect()
}
