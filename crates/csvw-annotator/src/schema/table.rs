//! Table descriptions: dialect plus schema.

use serde::{Deserialize, Serialize};

use super::column::{Column, GID};

/// How to read one table out of the raw file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dialect {
    /// Delimiter regex.
    pub delimiter: String,
    /// Lines before the table's first header row.
    pub skip_rows: usize,
    pub header_row_count: usize,
    pub encoding: String,
}

/// Columns of one table, keyed by the identifier column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub columns: Vec<Column>,
    pub primary_key: String,
    pub about_url: String,
}

impl TableSchema {
    /// Schema keyed by the generated `GID` column.
    pub fn with_columns(columns: Vec<Column>) -> Self {
        Self {
            columns,
            primary_key: GID.to_string(),
            about_url: format!("#gid-{{{}}}", GID),
        }
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }
}

/// One table of the annotated document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub url: String,
    pub dialect: Dialect,
    pub table_schema: TableSchema,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::column::IdentifierColumn;

    #[test]
    fn test_table_json_keys() {
        let table = Table {
            url: "run.csv".to_string(),
            dialect: Dialect {
                delimiter: ";".to_string(),
                skip_rows: 3,
                header_row_count: 1,
                encoding: "utf-8".to_string(),
            },
            table_schema: TableSchema::with_columns(vec![Column::Identifier(IdentifierColumn::gid())]),
        };
        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(value["dialect"]["skipRows"], 3);
        assert_eq!(value["dialect"]["headerRowCount"], 1);
        assert_eq!(value["tableSchema"]["primaryKey"], "GID");
        assert_eq!(value["tableSchema"]["aboutUrl"], "#gid-{GID}");
        assert!(table.table_schema.get_column("GID").is_some());
    }
}
