//! Region extraction: data regions into tables, meta regions into key/value blocks.

mod meta;
mod table;

pub use meta::{HeaderBlock, MetaEntry, MetaExtractor};
pub use table::{DataTable, TableExtractor};

use crate::error::{AnnotatorError, Result};
use crate::structure::{Delimiter, Splitter};

/// Splits single lines into fields.
///
/// Single-byte delimiters go through the `csv` reader so quoted fields keep
/// embedded delimiters; regex delimiters split directly and strip quotes.
#[derive(Debug, Clone)]
pub(crate) enum FieldReader {
    Csv(u8),
    Split(Splitter),
}

impl FieldReader {
    pub(crate) fn new(delimiter: &Delimiter) -> Result<Self> {
        match delimiter.as_byte() {
            Some(byte) => Ok(FieldReader::Csv(byte)),
            None => Ok(FieldReader::Split(delimiter.splitter()?)),
        }
    }

    /// Trimmed fields of one line; empty for a blank line.
    pub(crate) fn read(&self, line: &str) -> Result<Vec<String>> {
        if line.trim().is_empty() {
            return Ok(Vec::new());
        }
        match self {
            FieldReader::Csv(byte) => {
                let mut reader = csv::ReaderBuilder::new()
                    .delimiter(*byte)
                    .has_headers(false)
                    .flexible(true)
                    .trim(csv::Trim::All)
                    .from_reader(line.as_bytes());
                match reader.records().next() {
                    Some(record) => Ok(record?.iter().map(|s| s.to_string()).collect()),
                    None => Ok(Vec::new()),
                }
            }
            FieldReader::Split(splitter) => Ok(splitter
                .split(line.trim_end())
                .into_iter()
                .map(|field| unquote(field.trim()).to_string())
                .collect()),
        }
    }
}

/// Strip one pair of surrounding double quotes.
pub(crate) fn unquote(field: &str) -> &str {
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
}

/// Lines `[start, end)` of `lines`, or a malformed-region error when the
/// range does not fit.
pub(crate) fn region<'a, 'b>(lines: &'b [&'a str], start: usize, end: usize) -> Result<&'b [&'a str]> {
    lines.get(start..end).ok_or_else(|| AnnotatorError::MalformedRegion {
        start,
        end,
        message: format!("file has only {} lines", lines.len()),
    })
}
