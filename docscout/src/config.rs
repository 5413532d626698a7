use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::catalog;
use crate::errors::{SearchError, SearchResult};
use crate::filters::{extension_set, ExtensionSet};
use crate::search::matcher::DEFAULT_CONTEXT_CHARS;

/// Upper bound on the default worker count
pub const MAX_DEFAULT_THREADS: usize = 4;

/// Configuration for a scan.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations, later ones
/// overriding earlier ones:
/// 1. Global `$CONFIG_DIR/docscout/config.yaml`
/// 2. Local `.docscout.yaml` in the current directory
/// 3. Custom config file specified via `--config`
///
/// # Configuration Format
///
/// ```yaml
/// # Search pattern (regex, always case-insensitive)
/// pattern: "invoice-\\d+"
///
/// # Root directory to search in
/// root_path: "."
///
/// # Extensions to include, with or without the leading dot
/// file_extensions:
///   - "txt"
///   - ".xlsx"
///
/// # Catalog categories to include (names or 1-based numbers)
/// categories:
///   - "spreadsheets"
///
/// # Paths to skip, relative to root_path (glob syntax)
/// ignore_patterns:
///   - "build/**"
///
/// # Worker count (default: CPU cores, at most 4)
/// thread_count: 4
///
/// # Characters of context on each side of a text match
/// context_chars: 50
///
/// # Resolve shared-string cells in spreadsheets
/// resolve_shared_strings: true
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
///
/// When using the CLI, command-line arguments take precedence over config file
/// values; see [`SearchConfig::merge_with_cli`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// The search pattern (regex, matched case-insensitively).
    ///
    /// Must not be empty: an empty pattern would match at every character, so
    /// [`crate::Scan::new`] and [`crate::search`] both reject it with
    /// [`SearchError::InvalidPattern`].
    #[serde(default)]
    pub pattern: String,

    /// Root directory to start search from
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Optional list of file extensions to include (e.g., ["txt", ".csv"])
    #[serde(default)]
    pub file_extensions: Option<Vec<String>>,

    /// Catalog categories whose extensions are included
    #[serde(default)]
    pub categories: Vec<String>,

    /// Patterns to ignore (supports glob syntax)
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Number of workers scanning files
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Characters of context kept before and after a text match
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,

    /// Whether spreadsheet cells referring to the shared string table are resolved
    #[serde(default = "default_resolve_shared_strings")]
    pub resolve_shared_strings: bool,
}

/// Settings given explicitly on the command line; `None` keeps the loaded value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub pattern: Option<String>,
    pub root_path: Option<PathBuf>,
    pub file_extensions: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub ignore_patterns: Option<Vec<String>>,
    pub thread_count: Option<NonZeroUsize>,
    pub log_level: Option<String>,
    pub context_chars: Option<usize>,
    pub resolve_shared_strings: Option<bool>,
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

/// `min(available cores, 4)`, never less than one
pub fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get().min(MAX_DEFAULT_THREADS)).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_context_chars() -> usize {
    DEFAULT_CONTEXT_CHARS
}

fn default_resolve_shared_strings() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            root_path: default_root_path(),
            file_extensions: None,
            categories: Vec::new(),
            ignore_patterns: Vec::new(),
            thread_count: default_thread_count(),
            log_level: default_log_level(),
            context_chars: default_context_chars(),
            resolve_shared_strings: default_resolve_shared_strings(),
        }
    }
}

impl SearchConfig {
    /// Creates a configuration searching `root_path` for `pattern` with defaults elsewhere
    pub fn new(root_path: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from the default locations, plus `config_path` when given
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
        }

        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("docscout/config.yaml")),
            // Local config
            Some(PathBuf::from(".docscout.yaml")),
            // Custom config
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Merges command-line values over configuration file values.
    ///
    /// Every value given on the command line wins, including one equal to the default.
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(pattern) = cli.pattern {
            self.pattern = pattern;
        }
        if let Some(root_path) = cli.root_path {
            self.root_path = root_path;
        }
        if cli.file_extensions.is_some() {
            self.file_extensions = cli.file_extensions;
        }
        if let Some(categories) = cli.categories {
            self.categories = categories;
        }
        if let Some(ignore_patterns) = cli.ignore_patterns {
            self.ignore_patterns = ignore_patterns;
        }
        if let Some(thread_count) = cli.thread_count {
            self.thread_count = thread_count;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        if let Some(context_chars) = cli.context_chars {
            self.context_chars = context_chars;
        }
        if let Some(resolve) = cli.resolve_shared_strings {
            self.resolve_shared_strings = resolve;
        }
        self
    }

    /// The extension allow-set, or `None` when every file is eligible.
    ///
    /// Explicit extensions and category extensions are combined. Naming an
    /// unknown category is a configuration error.
    pub fn allowed_extensions(&self) -> SearchResult<Option<ExtensionSet>> {
        if self.file_extensions.is_none() && self.categories.is_empty() {
            return Ok(None);
        }

        let mut allowed = extension_set(self.file_extensions.iter().flatten());
        for selector in &self.categories {
            let category = catalog::resolve(selector).ok_or_else(|| {
                SearchError::config_error(format!("unknown category '{}'", selector.trim()))
            })?;
            allowed.extend(extension_set(category.extensions));
        }
        Ok(Some(allowed))
    }
}
