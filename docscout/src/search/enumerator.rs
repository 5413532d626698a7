use ignore::{DirEntry, WalkBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::extractor::format_for;
use crate::filters::{extension_of, has_allowed_extension, ExtensionSet, IgnoreSet};
use crate::results::FormatKind;

/// A file discovered under the scan root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    /// Normalised extension (`".txt"`), empty when the file has none
    pub extension: String,
}

impl CandidateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = extension_of(&path);
        Self { path, extension }
    }

    /// Format the file will be scanned as
    pub fn kind(&self) -> FormatKind {
        format_for(&self.path)
    }
}

/// Lists every regular file under `root` that passes the extension and ignore filters.
///
/// Hidden files and files excluded by `.gitignore` are included: nothing is
/// skipped unless the caller asked for it. Symlinks to regular files are
/// included, but symlinked directories are never descended into. Entries that
/// cannot be read (for example a directory without permission) are skipped.
pub fn enumerate(
    root: &Path,
    extensions: Option<&ExtensionSet>,
    ignore: &IgnoreSet,
) -> Vec<CandidateFile> {
    let mut walker = WalkBuilder::new(root);
    walker.standard_filters(false).follow_links(false);

    let files: Vec<CandidateFile> = walker
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(is_regular_file)
        .filter(|entry| {
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            has_allowed_extension(path, extensions) && !ignore.should_ignore(relative)
        })
        .map(|entry| CandidateFile::new(entry.into_path()))
        .collect();

    debug!("Found {} files to process under {}", files.len(), root.display());
    files
}

// A regular file, or a symlink whose target is one; dangling links are dropped
fn is_regular_file(entry: &DirEntry) -> bool {
    match entry.file_type() {
        Some(ft) if ft.is_file() => true,
        Some(ft) if ft.is_symlink() => fs::metadata(entry.path()).is_ok_and(|m| m.is_file()),
        _ => false,
    }
}
