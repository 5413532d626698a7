//! Path filtering used while enumerating candidate files.
//!
//! Extensions are compared in a normalised form: lower-case with the leading
//! dot, so `"TXT"`, `"txt"` and `".txt"` all mean the same thing. A file with no
//! extension has the empty extension `""`.
use glob::Pattern;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::warn;

/// Normalised set of allowed extensions
pub type ExtensionSet = BTreeSet<String>;

/// Normalises a user-supplied extension (`"RS"`, `"rs"`, `".rs"` all become `".rs"`)
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        String::new()
    } else {
        format!(".{}", ext.to_lowercase())
    }
}

/// Builds an [`ExtensionSet`] from arbitrary user input
pub fn extension_set<I, S>(extensions: I) -> ExtensionSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|ext| normalize_extension(ext.as_ref()))
        .filter(|ext| !ext.is_empty())
        .collect()
}

/// Returns the normalised extension of `path`, or `""` when it has none
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Checks if a file passes the extension allow-set; no set means every file passes
pub fn has_allowed_extension(path: &Path, extensions: Option<&ExtensionSet>) -> bool {
    match extensions {
        None => true,
        Some(exts) => exts.contains(&extension_of(path)),
    }
}

/// Compiled glob patterns for paths that must never be scanned
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<Pattern>,
}

impl IgnoreSet {
    /// Compiles the given glob patterns; invalid ones are logged and skipped
    pub fn new(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|pattern| match Pattern::new(pattern) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Ignoring invalid ignore pattern '{}': {}", pattern, e);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Checks if `path` (relative to the scan root) matches any ignore pattern
    pub fn should_ignore(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let normalized_path = path.to_string_lossy().replace('\\', "/");
        self.patterns.iter().any(|p| p.matches(&normalized_path))
    }
}
