//! Turning files into searchable content.
//!
//! Each [`ContentExtractor`] knows one file format. Plain files are decoded into
//! a single string; spreadsheet workbooks (`.xlsx`) are opened as zip archives
//! and flattened into the list of their cell values, sheet by sheet.
//!
//! Extractors never decide whether a failure is fatal: they return a
//! [`SearchError`] and the caller treats it as "this file has no matches".
use memmap2::Mmap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;
use tracing::{trace, warn};
use zip::ZipArchive;

use crate::errors::{SearchError, SearchResult};
use crate::filters::extension_of;
use crate::results::FormatKind;

const BUFFER_CAPACITY: usize = 65536;
pub(crate) const SMALL_FILE_THRESHOLD: u64 = 32 * 1024; // 32KB
pub(crate) const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// Extension routed to the spreadsheet extractor
pub const SPREADSHEET_EXTENSION: &str = ".xlsx";

const SPREADSHEET_NS: &[u8] = b"http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const SHARED_STRINGS_ENTRY: &str = "sharedStrings.xml";

/// Searchable content pulled out of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// The whole file as one string
    Text(String),
    /// Cell values in sheet and row order
    Cells(Vec<String>),
}

/// Result of a successful extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub content: Content,
    /// Size of the file on disk
    pub bytes_read: u64,
}

/// A format-specific way of reading a file's searchable content
pub trait ContentExtractor: Send + Sync {
    /// The format this extractor handles
    fn kind(&self) -> FormatKind;

    /// Reads `path` and returns its searchable content
    fn extract(&self, path: &Path) -> SearchResult<Extracted>;
}

/// Picks the format for a path from its extension alone
pub fn format_for(path: &Path) -> FormatKind {
    if extension_of(path) == SPREADSHEET_EXTENSION {
        FormatKind::Spreadsheet
    } else {
        FormatKind::Text
    }
}

/// Decodes bytes as UTF-8, dropping any invalid sequences
pub fn decode_lossy(bytes: &[u8], path: &Path) -> String {
    if let Ok(valid) = std::str::from_utf8(bytes) {
        return valid.to_owned();
    }

    let mut text = String::with_capacity(bytes.len());
    let mut dropped = 0;
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        dropped += chunk.invalid().len();
    }
    warn!(
        "Dropped {} invalid UTF-8 bytes in file: {}",
        dropped,
        path.display()
    );
    text
}

/// Reads whole files as text
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    fn read_small(path: &Path) -> SearchResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| SearchError::io_error(path, e))
    }

    fn read_buffered(path: &Path) -> SearchResult<Vec<u8>> {
        let file = File::open(path).map_err(|e| SearchError::io_error(path, e))?;
        let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| SearchError::io_error(path, e))?;
        Ok(bytes)
    }

    fn read_mapped(path: &Path) -> SearchResult<String> {
        let file = File::open(path).map_err(|e| SearchError::io_error(path, e))?;
        // The mapping only lives for the duration of the decode below
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| SearchError::io_error(path, e))?;
        Ok(decode_lossy(&mmap, path))
    }
}

impl ContentExtractor for PlainTextExtractor {
    fn kind(&self) -> FormatKind {
        FormatKind::Text
    }

    fn extract(&self, path: &Path) -> SearchResult<Extracted> {
        let size = std::fs::metadata(path)
            .map_err(|e| SearchError::io_error(path, e))?
            .len();

        let text = if size < SMALL_FILE_THRESHOLD {
            trace!("Reading small file: {}", path.display());
            decode_lossy(&Self::read_small(path)?, path)
        } else if size >= LARGE_FILE_THRESHOLD {
            trace!("Memory mapping large file: {}", path.display());
            Self::read_mapped(path)?
        } else {
            trace!("Reading buffered file: {}", path.display());
            decode_lossy(&Self::read_buffered(path)?, path)
        };

        Ok(Extracted {
            content: Content::Text(text),
            bytes_read: size,
        })
    }
}

/// Reads cell values out of `.xlsx` workbooks
#[derive(Debug, Clone, Copy)]
pub struct SpreadsheetExtractor {
    resolve_shared_strings: bool,
}

impl Default for SpreadsheetExtractor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SpreadsheetExtractor {
    /// With `resolve_shared_strings` off, shared-string cells yield their raw table index
    pub fn new(resolve_shared_strings: bool) -> Self {
        Self {
            resolve_shared_strings,
        }
    }

    /// Extracts cell values from any zip-backed reader
    pub fn extract_cells<R: Read + Seek>(&self, reader: R, path: &Path) -> SearchResult<Vec<String>> {
        let mut archive = ZipArchive::new(reader).map_err(|e| SearchError::archive(path, e))?;

        let mut sheet_entries = Vec::new();
        let mut shared_entry = None;
        for i in 0..archive.len() {
            let entry = archive.by_index(i).map_err(|e| SearchError::archive(path, e))?;
            let name = entry.name();
            if is_worksheet_entry(name) {
                sheet_entries.push(name.to_string());
            } else if name.ends_with(SHARED_STRINGS_ENTRY) {
                shared_entry = Some(name.to_string());
            }
        }

        let shared_strings = match (&shared_entry, self.resolve_shared_strings) {
            (Some(name), true) => {
                let entry = archive
                    .by_name(name)
                    .map_err(|e| SearchError::archive(path, e))?;
                Some(parse_shared_strings(BufReader::new(entry), path)?)
            }
            (None, true) => Some(Vec::new()),
            (_, false) => None,
        };

        let mut cells = Vec::new();
        for name in &sheet_entries {
            trace!("Reading worksheet {} in {}", name, path.display());
            let entry = archive
                .by_name(name)
                .map_err(|e| SearchError::archive(path, e))?;
            cells.extend(parse_sheet(
                BufReader::new(entry),
                shared_strings.as_deref(),
                path,
            )?);
        }
        Ok(cells)
    }
}

impl ContentExtractor for SpreadsheetExtractor {
    fn kind(&self) -> FormatKind {
        FormatKind::Spreadsheet
    }

    fn extract(&self, path: &Path) -> SearchResult<Extracted> {
        let file = File::open(path).map_err(|e| SearchError::io_error(path, e))?;
        let bytes_read = file
            .metadata()
            .map_err(|e| SearchError::io_error(path, e))?
            .len();
        let cells = self.extract_cells(BufReader::new(file), path)?;
        Ok(Extracted {
            content: Content::Cells(cells),
            bytes_read,
        })
    }
}

/// True for archive entries holding worksheet data (`.../worksheets/sheet*.xml`)
pub fn is_worksheet_entry(name: &str) -> bool {
    match name.rsplit_once('/') {
        Some((dir, file)) => {
            (dir == "worksheets" || dir.ends_with("/worksheets"))
                && file.starts_with("sheet")
                && file.ends_with(".xml")
        }
        None => false,
    }
}

fn in_spreadsheet_ns(ns: &ResolveResult) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == SPREADSHEET_NS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    SharedString,
    InlineString,
    Other,
}

// Text collected for one `<c>` element
#[derive(Debug)]
struct CellText {
    cell_type: CellType,
    value: String,
    inline: String,
}

impl CellText {
    fn start(element: &BytesStart) -> Self {
        let cell_type = match element.try_get_attribute("t") {
            Ok(Some(attr)) => match attr.value.as_ref() {
                b"s" => CellType::SharedString,
                b"inlineStr" => CellType::InlineString,
                _ => CellType::Other,
            },
            _ => CellType::Other,
        };
        Self {
            cell_type,
            value: String::new(),
            inline: String::new(),
        }
    }

    fn finish(self, shared_strings: Option<&[String]>) -> Option<String> {
        let text = match (self.cell_type, shared_strings) {
            (CellType::SharedString, Some(table)) => self
                .value
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|index| table.get(index).cloned())
                .unwrap_or(self.value),
            (CellType::InlineString, Some(_)) => self.inline,
            _ => self.value,
        };
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Value,
    Inline,
}

/// Collects cell values from one worksheet, row by row
fn parse_sheet<R: BufRead>(
    reader: R,
    shared_strings: Option<&[String]>,
    path: &Path,
) -> SearchResult<Vec<String>> {
    let mut reader = NsReader::from_reader(reader);
    let mut buf = Vec::new();
    let mut cells = Vec::new();

    let mut row_depth = 0usize;
    let mut cell: Option<CellText> = None;
    let mut capture: Option<Capture> = None;
    let mut in_phonetic = false;

    loop {
        let (ns, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| SearchError::xml(path, e))?;
        let ours = in_spreadsheet_ns(&ns);

        match event {
            Event::Start(e) if ours => match e.local_name().as_ref() {
                b"row" => row_depth += 1,
                b"c" if row_depth > 0 => cell = Some(CellText::start(&e)),
                b"v" if cell.is_some() => capture = Some(Capture::Value),
                b"rPh" => in_phonetic = true,
                b"t" if cell.is_some() && !in_phonetic => capture = Some(Capture::Inline),
                _ => {}
            },
            Event::End(e) if ours => match e.local_name().as_ref() {
                b"row" => row_depth = row_depth.saturating_sub(1),
                b"c" => {
                    if let Some(text) = cell.take().and_then(|c| c.finish(shared_strings)) {
                        cells.push(text);
                    }
                }
                b"v" | b"t" => capture = None,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Text(text) => {
                if let (Some(target), Some(current)) = (capture, cell.as_mut()) {
                    let text = text.unescape().map_err(|e| SearchError::xml(path, e))?;
                    match target {
                        Capture::Value => current.value.push_str(&text),
                        Capture::Inline => current.inline.push_str(&text),
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(cells)
}

/// Reads the shared string table; entry `i` is the text of the i-th `<si>`
fn parse_shared_strings<R: BufRead>(reader: R, path: &Path) -> SearchResult<Vec<String>> {
    let mut reader = NsReader::from_reader(reader);
    let mut buf = Vec::new();
    let mut strings = Vec::new();

    let mut current: Option<String> = None;
    let mut capturing = false;
    let mut in_phonetic = false;

    loop {
        let (ns, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| SearchError::xml(path, e))?;
        let ours = in_spreadsheet_ns(&ns);

        match event {
            Event::Start(e) if ours => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => in_phonetic = true,
                b"t" if current.is_some() && !in_phonetic => capturing = true,
                _ => {}
            },
            Event::Empty(e) if ours && e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Event::End(e) if ours => match e.local_name().as_ref() {
                b"si" => strings.push(current.take().unwrap_or_default()),
                b"rPh" => in_phonetic = false,
                b"t" => capturing = false,
                _ => {}
            },
            Event::Text(text) if capturing => {
                if let Some(current) = current.as_mut() {
                    current.push_str(&text.unescape().map_err(|e| SearchError::xml(path, e))?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}
