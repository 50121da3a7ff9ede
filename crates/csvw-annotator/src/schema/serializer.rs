//! Turns extracted regions into JSON-LD annotation nodes and table schemas.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

use super::column::{Column, DataColumn, IdentifierColumn, UnitRef};
use super::document::{Body, Note, QuantityValue, TextualBody, TypedLiteral};
use super::table::{Dialect, Table, TableSchema};
use crate::extract::{DataTable, HeaderBlock, MetaEntry};
use crate::inference::{
    classify, parse_bool, parse_date, parse_float, parse_int, CellType, UnitBinding, UnitResolver,
};
use crate::structure::Delimiter;

static NON_ID_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-ZÜÖÄa-z0-9]+").unwrap());

/// Placeholders the meta reader may see for missing values.
const MISSING_TOKENS: &[&str] = &["nan", "None"];

/// Identifier for a label: transliterated, title-cased, alphanumerics only.
///
/// `"Prüfgeschwindigkeit [mm/min]"` becomes `"PruefgeschwindigkeitMmMin"`.
pub fn make_id(label: &str) -> String {
    let mut transliterated = String::with_capacity(label.len());
    for c in label.chars() {
        match c {
            'ä' => transliterated.push_str("ae"),
            'ö' => transliterated.push_str("oe"),
            'ü' => transliterated.push_str("ue"),
            'Ä' => transliterated.push_str("Ae"),
            'Ö' => transliterated.push_str("Oe"),
            'Ü' => transliterated.push_str("Ue"),
            'ß' => transliterated.push_str("ss"),
            c => transliterated.push(c),
        }
    }
    let titled = title_case(&transliterated).replace(' ', "");
    NON_ID_CHARS.replace_all(&titled, "").into_owned()
}

/// Upper-case the first letter of every letter run, lower-case the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Builds document fragments, probing units on the way.
#[derive(Debug, Clone)]
pub struct Serializer {
    units: UnitResolver,
}

impl Serializer {
    pub fn new(units: UnitResolver) -> Self {
        Self { units }
    }

    // =========================================================================
    // VALUES
    // =========================================================================

    /// Describe one cell: a quantity for numeric, boolean and temporal
    /// values, a textual tag otherwise, nothing for blanks.
    pub fn describe_value(&self, value: &str) -> Option<Body> {
        let value = value.trim();
        let cell_type = classify(value);
        let datatype = cell_type.datatype()?.iri();

        let literal = match cell_type {
            CellType::Int => parse_int(value)
                .map(Value::from)
                .or_else(|| parse_float(value).and_then(Number::from_f64).map(Value::Number)),
            CellType::Float => parse_float(value).and_then(Number::from_f64).map(Value::Number),
            CellType::Bool => parse_bool(value).map(Value::Bool),
            CellType::Date => parse_date(value).map(|d| Value::String(d.iso())),
            CellType::Text | CellType::Blank => None,
        };

        Some(match literal {
            Some(literal) => Body::Quantity(QuantityValue {
                value: TypedLiteral::new(literal, datatype),
                unit: None,
            }),
            None => Body::Textual(TextualBody::tag(value)),
        })
    }

    // =========================================================================
    // META
    // =========================================================================

    /// One annotation node per parameter.
    pub fn serialize_meta(&self, block: &HeaderBlock) -> Vec<Note> {
        block.iter().map(|entry| self.serialize_entry(entry)).collect()
    }

    fn serialize_entry(&self, entry: &MetaEntry) -> Note {
        let (label, row_unit) = self.split_label_unit(&entry.param);
        let mut note = Note::new(format!("{}{}", make_id(label), entry.row), label.trim(), entry.row);

        for raw in &entry.values {
            let value = raw.trim().trim_matches('"').trim();
            if value.is_empty() || MISSING_TOKENS.contains(&value) {
                continue;
            }

            let (remainder, cell_unit) = self.split_value_unit(value);
            if remainder.is_empty() {
                // A lone unit belongs to the last quantity of the row
                let last_quantity = note.bodies.iter().rposition(Body::is_quantity);
                match (last_quantity, cell_unit) {
                    (Some(i), Some(unit)) => {
                        if let Body::Quantity(quantity) = &mut note.bodies[i] {
                            quantity.unit = Some(unit.into());
                        }
                    }
                    _ => note.bodies.extend(self.describe_value(value)),
                }
                continue;
            }

            match self.describe_value(&remainder) {
                Some(Body::Quantity(mut quantity)) => {
                    quantity.unit = cell_unit.or_else(|| row_unit.clone()).map(UnitRef::from);
                    note.bodies.push(Body::Quantity(quantity));
                }
                _ => note.bodies.extend(self.describe_value(value)),
            }
        }
        note
    }

    /// Split a trailing unit word off a parameter name.
    fn split_label_unit<'a>(&self, param: &'a str) -> (&'a str, Option<UnitBinding>) {
        if let Some((head, last)) = param.rsplit_once(' ') {
            if let Some(unit) = self.units.resolve(last) {
                return (head, Some(unit));
            }
        }
        (param, None)
    }

    /// Find the first unit word in a value and remove it, unless it is the
    /// count unit whose token is the number itself.
    fn split_value_unit(&self, value: &str) -> (String, Option<UnitBinding>) {
        let parts: Vec<&str> = value.split(' ').collect();
        for (i, part) in parts.iter().enumerate() {
            let Some(unit) = self.units.resolve(part.trim()) else {
                continue;
            };
            if unit.is_count() {
                return (value.to_string(), Some(unit));
            }
            let remainder = parts
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, p)| *p)
                .collect::<Vec<_>>()
                .join(" ");
            return (remainder.trim().to_string(), Some(unit));
        }
        (value.to_string(), None)
    }

    // =========================================================================
    // TABLES
    // =========================================================================

    /// Column schema of a parsed table, led by the `GID` column.
    pub fn describe_table(&self, table: &DataTable) -> TableSchema {
        let mut columns = Vec::with_capacity(table.column_count() + 1);
        columns.push(Column::Identifier(IdentifierColumn::gid()));

        for (col, titles) in table.titles.iter().enumerate() {
            let name = make_id(&titles.join(" "));
            let unit = titles
                .iter()
                .flat_map(|title| title.split(' '))
                .find_map(|part| self.units.resolve(part));

            let mut column = DataColumn::new(name, titles.clone());
            if let Some(unit) = unit {
                column = column.with_unit(unit.into());
            }
            if let Some(datatype) = table.sample(col).and_then(|v| classify(v).datatype()) {
                column = column.with_format(datatype.iri());
            }
            columns.push(Column::Data(column));
        }

        TableSchema::with_columns(columns)
    }

    /// Table description with its reading dialect.
    pub fn table(&self, table: &DataTable, url: &str, delimiter: &Delimiter, encoding: &str) -> Table {
        Table {
            url: url.to_string(),
            dialect: Dialect {
                delimiter: delimiter.pattern().to_string(),
                skip_rows: table.start,
                header_row_count: table.header_row_count,
                encoding: encoding.to_string(),
            },
            table_schema: self.describe_table(table),
        }
    }
}
