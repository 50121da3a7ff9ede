//! Meta region parsing into parameter/value rows.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{region, FieldReader};
use crate::error::{AnnotatorError, Result};
use crate::structure::Delimiter;

/// One parameter line of a meta region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    /// Parameter name, trailing colon stripped.
    pub param: String,
    /// Remaining fields of the line.
    pub values: Vec<String>,
    /// Original file line index.
    pub row: usize,
}

impl MetaEntry {
    /// Number of non-blank values.
    pub fn value_count(&self) -> usize {
        self.values.iter().filter(|v| !v.trim().is_empty()).count()
    }
}

/// Key/value table of a meta region, keyed by parameter in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderBlock {
    pub entries: IndexMap<String, MetaEntry>,
}

impl HeaderBlock {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, param: &str) -> Option<&MetaEntry> {
        self.entries.get(param)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetaEntry> {
        self.entries.values()
    }
}

/// Parses meta regions with their own delimiter.
#[derive(Debug, Clone)]
pub struct MetaExtractor {
    reader: FieldReader,
}

impl MetaExtractor {
    pub fn new(delimiter: &Delimiter) -> Result<Self> {
        Ok(Self {
            reader: FieldReader::new(delimiter)?,
        })
    }

    /// Parse lines `[start, end)`.
    ///
    /// Repeated parameters keep their first line, even when that line is
    /// later dropped for having no value.
    pub fn extract(&self, lines: &[&str], start: usize, end: usize) -> Result<HeaderBlock> {
        let mut entries: IndexMap<String, MetaEntry> = IndexMap::new();

        for (offset, line) in region(lines, start, end)?.iter().enumerate() {
            let row = start + offset;
            let mut fields = self
                .reader
                .read(line)
                .map_err(|e| AnnotatorError::MalformedRegion {
                    start,
                    end,
                    message: format!("line {}: {}", row, e),
                })?
                .into_iter();

            let Some(first) = fields.next() else {
                continue;
            };
            let param = first.strip_suffix(':').unwrap_or(&first).trim().to_string();
            if param.is_empty() {
                continue;
            }

            entries.entry(param.clone()).or_insert_with(|| MetaEntry {
                param,
                values: fields.collect(),
                row,
            });
        }

        entries.retain(|_, entry| entry.value_count() >= 1);
        debug!(start, end, params = entries.len(), "parsed meta block");

        if entries.is_empty() {
            return Err(AnnotatorError::EmptySegment { start, end });
        }
        Ok(HeaderBlock { entries })
    }
}
