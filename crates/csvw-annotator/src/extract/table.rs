//! Data region parsing with header-row detection.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{region, FieldReader};
use crate::error::{AnnotatorError, Result};
use crate::inference::is_header_row;
use crate::structure::Delimiter;

/// A table parsed from one data region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    /// First file line of the region.
    pub start: usize,
    /// Number of leading header rows (0, 1 or stacked).
    pub header_row_count: usize,
    /// Per column, the header cells top to bottom.
    pub titles: Vec<Vec<String>>,
    /// Data rows, each padded to the column count.
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn column_count(&self) -> usize {
        self.titles.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col).map(|s| s.as_str()))
    }

    /// The cell used to infer a column's datatype: second data row, or the
    /// first when there is only one.
    pub fn sample(&self, col: usize) -> Option<&str> {
        self.get(1, col).or_else(|| self.get(0, col))
    }
}

/// Parses data regions with a fixed delimiter.
#[derive(Debug, Clone)]
pub struct TableExtractor {
    reader: FieldReader,
}

impl TableExtractor {
    pub fn new(delimiter: &Delimiter) -> Result<Self> {
        Ok(Self {
            reader: FieldReader::new(delimiter)?,
        })
    }

    /// Leading rows whose every cell is blank, text or integer.
    ///
    /// A region made only of such rows is read as one header row plus data.
    pub fn header_row_count(records: &[Vec<String>]) -> usize {
        let count = records
            .iter()
            .take_while(|fields| is_header_row(fields.iter().map(String::as_str)))
            .count();
        if count == records.len() {
            count.min(1)
        } else {
            count
        }
    }

    /// Parse lines `[start, end)` into a table.
    ///
    /// Rows with more fields than the header are dropped; shorter rows are
    /// padded with blanks. A region without data rows yields
    /// [`AnnotatorError::EmptySegment`].
    pub fn extract(&self, lines: &[&str], start: usize, end: usize) -> Result<DataTable> {
        let mut records = Vec::new();
        for (offset, line) in region(lines, start, end)?.iter().enumerate() {
            let fields = self.reader.read(line).map_err(|e| AnnotatorError::MalformedRegion {
                start,
                end,
                message: format!("line {}: {}", start + offset, e),
            })?;
            if !fields.is_empty() {
                records.push((start + offset, fields));
            }
        }

        let fields_only: Vec<Vec<String>> = records.iter().map(|(_, f)| f.clone()).collect();
        let header_row_count = Self::header_row_count(&fields_only);

        let column_count = records
            .iter()
            .take(header_row_count.max(1))
            .map(|(_, f)| f.len())
            .max()
            .unwrap_or(0);
        if column_count == 0 {
            return Err(AnnotatorError::EmptySegment { start, end });
        }

        let titles = (0..column_count)
            .map(|col| {
                if header_row_count == 0 {
                    return vec![col.to_string()];
                }
                records[..header_row_count]
                    .iter()
                    .map(|(_, fields)| match fields.get(col) {
                        Some(title) if !title.is_empty() => title.clone(),
                        _ => format!("Unnamed: {}", col),
                    })
                    .collect()
            })
            .collect();

        let mut rows = Vec::with_capacity(records.len().saturating_sub(header_row_count));
        for (line_no, mut fields) in records.into_iter().skip(header_row_count) {
            if fields.len() > column_count {
                warn!(
                    line = line_no,
                    fields = fields.len(),
                    expected = column_count,
                    "dropping row with too many fields"
                );
                continue;
            }
            fields.resize(column_count, String::new());
            rows.push(fields);
        }

        if rows.is_empty() {
            return Err(AnnotatorError::EmptySegment { start, end });
        }

        debug!(start, end, header_row_count, columns = column_count, rows = rows.len(), "parsed table");
        Ok(DataTable {
            start,
            header_row_count,
            titles,
            rows,
        })
    }
}
