pub mod catalog;
pub mod config;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod progress;
pub mod results;
pub mod search;

pub use config::{CliOverrides, SearchConfig};
pub use errors::{ErrorClass, SearchError, SearchResult};
pub use progress::{ProgressSnapshot, ProgressTracker};
pub use results::{FileResult, FormatKind, MatchRecord, ResultSet};
pub use search::{search, Scan};
