//! CSVW/JSON-LD document model and the serializer that fills it.

mod column;
mod document;
mod serializer;
mod table;

pub use column::{Column, DataColumn, IdRef, IdentifierColumn, UnitRef, GID};
pub use document::{
    AnnotatedDocument, Annotation, Body, Context, ContextEntry, Note, QuantityValue, TextualBody,
    TypedLiteral, CSVW_CONTEXT,
};
pub use serializer::{make_id, Serializer};
pub use table::{Dialect, Table, TableSchema};
