//! Semantic typing: cell value types and measurement units.

mod units;
mod value_type;

pub use units::{
    normalize_token, UnitBinding, UnitEntity, UnitIndex, UnitIndexStats, UnitLookup, UnitResolver,
    NUM_UNIT, QUDT_SCHEMA_NS, QUDT_UNIT_NS,
};
pub use value_type::{
    classify, classify_typed, is_header_row, normalize_decimal, parse_bool, parse_date, parse_float,
    parse_int, CellType, ParsedDate, Xsd,
};
