//! Per-cell value type classification.
//!
//! Classification is a fixed decision table over the trimmed cell text:
//!
//! 1. empty → [`CellType::Blank`]
//! 2. integer literal → [`CellType::Int`]
//! 3. float literal (decimal comma accepted) → [`CellType::Float`]
//! 4. `true` / `false` → [`CellType::Bool`]
//! 5. a single bare word → [`CellType::Text`]
//! 6. a parseable date, date-time or time → [`CellType::Date`]
//! 7. anything else → [`CellType::Text`]

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================

static INT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[+-]?(?:0+|[1-9](?:_?[0-9])*|0[xX](?:_?[0-9a-fA-F])+|0[oO](?:_?[0-7])+|0[bB](?:_?[01])+)$",
    )
    .unwrap()
});

/// A float literal needs a decimal point or an exponent.
static FLOAT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:(?:[0-9]+\.[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+)$").unwrap()
});

/// A lone identifier-like word ("Jan", "value_mm", "Länge").
static BARE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}_][\p{L}\p{N}_]*$").unwrap());

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d.%m.%y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d-%b-%Y",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

// =============================================================================
// TYPES
// =============================================================================

/// XML Schema datatype a cell type serializes as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Xsd {
    String,
    Integer,
    Double,
    Boolean,
    DateTime,
}

impl Xsd {
    const NAMESPACE: &'static str = "http://www.w3.org/2001/XMLSchema#";

    /// Full datatype IRI.
    pub fn iri(&self) -> String {
        format!("{}{}", Self::NAMESPACE, self.local_name())
    }

    fn local_name(&self) -> &'static str {
        match self {
            Xsd::String => "string",
            Xsd::Integer => "integer",
            Xsd::Double => "double",
            Xsd::Boolean => "boolean",
            Xsd::DateTime => "dateTime",
        }
    }
}

impl fmt::Display for Xsd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.iri())
    }
}

impl From<Xsd> for String {
    fn from(x: Xsd) -> Self {
        x.iri()
    }
}

impl TryFrom<String> for Xsd {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let local = value.strip_prefix(Xsd::NAMESPACE).unwrap_or(&value);
        let local = local.strip_prefix("xsd:").unwrap_or(local);
        match local {
            "string" => Ok(Xsd::String),
            "integer" => Ok(Xsd::Integer),
            "double" => Ok(Xsd::Double),
            "boolean" => Ok(Xsd::Boolean),
            "dateTime" => Ok(Xsd::DateTime),
            other => Err(format!("unsupported datatype '{}'", other)),
        }
    }
}

/// Value type of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CellType {
    Blank,
    Text,
    Int,
    Float,
    Bool,
    Date,
}

impl CellType {
    /// Canonical serialization datatype; blanks have none.
    pub fn datatype(&self) -> Option<Xsd> {
        match self {
            CellType::Blank => None,
            CellType::Text => Some(Xsd::String),
            CellType::Int => Some(Xsd::Integer),
            CellType::Float => Some(Xsd::Double),
            CellType::Bool => Some(Xsd::Boolean),
            CellType::Date => Some(Xsd::DateTime),
        }
    }

    /// Whether a cell of this type may appear in a header row.
    ///
    /// Header rows can hold numeric column indices, but never measured
    /// values, flags or timestamps.
    pub fn is_header_like(&self) -> bool {
        matches!(self, CellType::Blank | CellType::Text | CellType::Int)
    }

    /// Whether cells of this type become quantity values.
    pub fn is_quantity(&self) -> bool {
        matches!(
            self,
            CellType::Int | CellType::Float | CellType::Bool | CellType::Date
        )
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Classify one raw cell.
pub fn classify(value: &str) -> CellType {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return CellType::Blank;
    }

    let literal = normalize_decimal(trimmed);
    if INT_PATTERN.is_match(&literal) {
        return CellType::Int;
    }
    if FLOAT_PATTERN.is_match(&literal) {
        return CellType::Float;
    }
    if is_bool(trimmed) {
        return CellType::Bool;
    }
    if BARE_WORD.is_match(trimmed) {
        return CellType::Text;
    }
    if parse_date(trimmed).is_some() {
        return CellType::Date;
    }
    CellType::Text
}

/// Classify and return the canonical datatype alongside.
pub fn classify_typed(value: &str) -> (CellType, Option<Xsd>) {
    let cell_type = classify(value);
    (cell_type, cell_type.datatype())
}

/// Whether every field of a row could belong to a header.
pub fn is_header_row<'a>(fields: impl IntoIterator<Item = &'a str>) -> bool {
    fields.into_iter().all(|f| classify(f).is_header_like())
}

/// Replace decimal commas with dots, borrowing when there are none.
pub fn normalize_decimal(value: &str) -> Cow<'_, str> {
    if value.contains(',') {
        Cow::Owned(value.replace(',', "."))
    } else {
        Cow::Borrowed(value)
    }
}

fn is_bool(value: &str) -> bool {
    parse_bool(value).is_some()
}

/// Boolean literal value.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "True" | "true" | "TRUE" => Some(true),
        "False" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Integer value of an INT cell.
pub fn parse_int(value: &str) -> Option<i64> {
    let literal = normalize_decimal(value.trim()).replace('_', "");
    let (negative, digits) = match literal.as_bytes().first() {
        Some(b'-') => (true, &literal[1..]),
        Some(b'+') => (false, &literal[1..]),
        _ => (false, literal.as_str()),
    };

    let radix_digits = |prefix: [&str; 2]| {
        digits
            .strip_prefix(prefix[0])
            .or_else(|| digits.strip_prefix(prefix[1]))
    };
    let magnitude = if let Some(hex) = radix_digits(["0x", "0X"]) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = radix_digits(["0o", "0O"]) {
        i64::from_str_radix(oct, 8).ok()?
    } else if let Some(bin) = radix_digits(["0b", "0B"]) {
        i64::from_str_radix(bin, 2).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };

    Some(if negative { -magnitude } else { magnitude })
}

/// Floating-point value of a numeric cell, decimal comma accepted.
pub fn parse_float(value: &str) -> Option<f64> {
    normalize_decimal(value.trim())
        .replace('_', "")
        .parse::<f64>()
        .ok()
}

// =============================================================================
// DATES
// =============================================================================

/// A temporal cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    DateTime(NaiveDateTime),
    /// Clock time without a calendar date.
    Time(NaiveTime),
}

impl ParsedDate {
    /// ISO 8601 rendering; whole seconds drop the fraction.
    pub fn iso(&self) -> String {
        match self {
            ParsedDate::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            ParsedDate::Time(t) => t.format("%H:%M:%S%.f").to_string(),
        }
    }
}

/// Parse a date, date-time or time in the common notations.
pub fn parse_date(value: &str) -> Option<ParsedDate> {
    let value = value.trim();
    // Every supported notation has a digit in it
    if !value.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(ParsedDate::DateTime(dt.naive_local()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(ParsedDate::DateTime(dt.naive_local()));
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ParsedDate::DateTime(dt));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            return d.and_hms_opt(0, 0, 0).map(ParsedDate::DateTime);
        }
    }
    for format in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(value, format) {
            return Some(ParsedDate::Time(t));
        }
    }
    None
}
