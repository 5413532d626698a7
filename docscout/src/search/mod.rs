//! The concurrent scanning pipeline.
//!
//! A scan runs in four stages:
//!
//! 1. **Enumerate** ([`enumerator`]): walk the root directory and collect every
//!    candidate file up front, so the total is known before work begins.
//! 2. **Dispatch** ([`engine`]): a fixed pool of workers claims files from the
//!    shared [`engine::Backlog`] until it runs dry.
//! 3. **Extract and match** ([`extractor`], [`matcher`], [`processor`]): each
//!    file is read by the extractor for its format and searched with the
//!    case-insensitive pattern.
//! 4. **Aggregate**: workers push per-file results into a channel; once every
//!    worker has returned, the channel is drained into a [`crate::ResultSet`].
//!
//! A failure inside one file never leaves that file's worker iteration: it is
//! handed to the [`ScanReporter`] and the worker moves on.
//!
//! ```rust,ignore
//! let scan = Scan::new(&SearchConfig::new("./reports", "invoice"))?;
//! let progress = scan.progress();
//! let results = scan.run(&TracingReporter)?;
//! println!("{} files processed", progress.processed());
//! ```
pub mod engine;
pub mod enumerator;
pub mod extractor;
pub mod matcher;
pub mod processor;
pub mod reporter;

pub use engine::{search, Backlog, Scan};
pub use enumerator::{enumerate, CandidateFile};
pub use extractor::{ContentExtractor, PlainTextExtractor, SpreadsheetExtractor};
pub use matcher::PatternMatcher;
pub use processor::FileProcessor;
pub use reporter::{CollectingReporter, FileFailure, ScanReporter, TracingReporter};
