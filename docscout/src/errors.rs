//! Error types for docscout.
//!
//! Every failure a scan can hit is a [`SearchError`]. The variants fall into a
//! small number of classes (see [`ErrorClass`]) and the class decides how far an
//! error travels:
//!
//! - **Configuration** errors (a bad pattern, an unknown category) are returned
//!   from [`crate::Scan::new`] before any file is touched.
//! - **Access** and **Parse** errors belong to a single file. The worker that
//!   hit them hands them to the [`crate::search::ScanReporter`] and moves on to
//!   the next file; they never show up as match data.
//! - **Internal** errors (the worker pool could not be started) abort the scan.
//!
//! Undecodable text has no variant: plain-text files are decoded lossily, so
//! invalid UTF-8 sequences are dropped and logged instead of failing the file.
//!
//! ```rust,ignore
//! match Scan::new(&config) {
//!     Ok(scan) => scan.run(&TracingReporter)?,
//!     Err(SearchError::InvalidPattern(msg)) => // Report the typo to the user,
//!     Err(e) => // Other configuration problems
//! }
//! ```
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Malformed archive {path}: {message}")]
    Archive { path: PathBuf, message: String },
    #[error("Malformed XML in {path}: {message}")]
    Xml { path: PathBuf, message: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

/// Coarse classification used to decide whether an error stops the scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Invalid input detected before scanning starts
    Configuration,
    /// A file or directory could not be opened or read
    Access,
    /// A container, its XML payload or a saved result file is malformed
    Parse,
    /// The scanning machinery itself failed
    Internal,
}

impl SearchError {
    pub fn invalid_pattern(msg: impl Into<String>) -> Self {
        Self::InvalidPattern(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn archive(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Archive {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn xml(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Xml {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn worker_pool(msg: impl ToString) -> Self {
        Self::WorkerPool(msg.to_string())
    }

    /// Maps an I/O failure on `path` onto the most specific access variant
    pub fn io_error(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::file_not_found(path),
            io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }

    /// Returns the class this error belongs to
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidPattern(_) | Self::ConfigError(_) => ErrorClass::Configuration,
            Self::FileNotFound(_) | Self::PermissionDenied(_) | Self::IoError(_) => {
                ErrorClass::Access
            }
            Self::Archive { .. } | Self::Xml { .. } | Self::Json(_) => ErrorClass::Parse,
            Self::WorkerPool(_) => ErrorClass::Internal,
        }
    }

    /// True when the error must abort the whole scan rather than a single file
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::Configuration | ErrorClass::Internal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let path = Path::new("test.txt");
        let err = SearchError::file_not_found(path);
        assert!(matches!(err, SearchError::FileNotFound(_)));

        let err = SearchError::permission_denied(path);
        assert!(matches!(err, SearchError::PermissionDenied(_)));

        let err = SearchError::invalid_pattern("unclosed group");
        assert!(matches!(err, SearchError::InvalidPattern(_)));

        let err = SearchError::archive(path, "invalid Zip archive");
        assert!(matches!(err, SearchError::Archive { .. }));
    }

    #[test]
    fn test_error_messages() {
        let err = SearchError::invalid_pattern("missing closing parenthesis");
        assert_eq!(
            err.to_string(),
            "Invalid pattern: missing closing parenthesis"
        );

        let err = SearchError::config_error("unknown category 'pictures'");
        assert_eq!(
            err.to_string(),
            "Configuration error: unknown category 'pictures'"
        );

        let err = SearchError::xml("book.xlsx", "unexpected end of input");
        assert_eq!(
            err.to_string(),
            "Malformed XML in book.xlsx: unexpected end of input"
        );
    }

    #[test]
    fn test_io_error_mapping() {
        let path = Path::new("gone.txt");
        let err = SearchError::io_error(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, SearchError::FileNotFound(p) if p == path));

        let err = SearchError::io_error(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, SearchError::PermissionDenied(_)));

        let err = SearchError::io_error(path, io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(matches!(err, SearchError::IoError(_)));
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(
            SearchError::invalid_pattern("(").class(),
            ErrorClass::Configuration
        );
        assert_eq!(
            SearchError::permission_denied("a").class(),
            ErrorClass::Access
        );
        assert_eq!(SearchError::archive("a", "bad").class(), ErrorClass::Parse);
        assert_eq!(SearchError::xml("a", "bad").class(), ErrorClass::Parse);

        assert!(SearchError::invalid_pattern("(").is_fatal());
        assert!(SearchError::worker_pool("no threads").is_fatal());
        assert!(!SearchError::file_not_found("a").is_fatal());
        assert!(!SearchError::xml("a", "bad").is_fatal());
    }
}
