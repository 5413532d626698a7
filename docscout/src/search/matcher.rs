use regex::{Regex, RegexBuilder};

use crate::errors::{SearchError, SearchResult};
use crate::results::MatchRecord;

/// Characters of context kept on each side of a text match
pub const DEFAULT_CONTEXT_CHARS: usize = 50;

/// Context attached to spreadsheet matches, which carry no surrounding text
pub const CELL_CONTEXT: &str = "Found in cell";

const ELLIPSIS: &str = "...";

/// Case-insensitive pattern matching over extracted content
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
    context_chars: usize,
}

impl PatternMatcher {
    /// Compiles `pattern` case-insensitively with the default context width
    pub fn new(pattern: &str) -> SearchResult<Self> {
        Self::with_context(pattern, DEFAULT_CONTEXT_CHARS)
    }

    /// Compiles `pattern` keeping `context_chars` characters on each side of a match
    pub fn with_context(pattern: &str, context_chars: usize) -> SearchResult<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| SearchError::invalid_pattern(e.to_string()))?;
        Ok(Self {
            regex,
            context_chars,
        })
    }

    /// Finds all non-overlapping matches in `text`, in order of appearance
    pub fn find_in_text(&self, text: &str) -> Vec<MatchRecord> {
        self.regex
            .find_iter(text)
            .map(|m| MatchRecord {
                matched: m.as_str().to_string(),
                context: context_window(text, m.start(), m.end(), self.context_chars),
            })
            .collect()
    }

    /// Returns a record carrying the whole cell value if the pattern occurs in it
    pub fn match_cell(&self, cell: &str) -> Option<MatchRecord> {
        self.regex.is_match(cell).then(|| MatchRecord {
            matched: cell.to_string(),
            context: CELL_CONTEXT.to_string(),
        })
    }

    /// Matches every cell in order, one record per matching cell
    pub fn find_in_cells<'a, I>(&self, cells: I) -> Vec<MatchRecord>
    where
        I: IntoIterator<Item = &'a str>,
    {
        cells
            .into_iter()
            .filter_map(|cell| self.match_cell(cell))
            .collect()
    }
}

/// Builds the context string for the match at byte range `start..end`.
///
/// The window extends `chars` characters before and after the match, clamped to
/// the text, with line breaks turned into spaces and ellipses on both sides.
pub fn context_window(text: &str, start: usize, end: usize, chars: usize) -> String {
    let from = window_start(text, start, chars);
    let to = window_end(text, end, chars);
    let snippet: String = text[from..to]
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    format!("{ELLIPSIS}{}{ELLIPSIS}", snippet.trim())
}

// Byte offset `chars` characters before `start`, or 0
fn window_start(text: &str, start: usize, chars: usize) -> usize {
    if chars == 0 {
        return start;
    }
    text[..start]
        .char_indices()
        .rev()
        .take(chars)
        .last()
        .map_or(start, |(i, _)| i)
}

// Byte offset `chars` characters after `end`, or the end of the text
fn window_end(text: &str, end: usize, chars: usize) -> usize {
    text[end..]
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(i, _)| end + i)
}
