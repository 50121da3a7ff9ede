//! csvw-annotator: structure recovery and semantic typing for messy CSV files.
//!
//! Takes a loosely structured text file that may mix free-form metadata
//! lines, `key: value` blocks and one or more tables with different
//! delimiters, and describes it as a CSVW JSON-LD document: the metadata
//! lines become `oa:Annotation` notes, the tables become table schemas with
//! inferred datatypes and QUDT unit bindings.
//!
//! # Pipeline
//!
//! - **Encoding**: detect and decode the raw bytes
//! - **Segmentation**: split the file into regions of equal delimiter signature
//! - **Extraction**: meta regions into key/value blocks, data regions into tables
//! - **Serialization**: typed values, units and column schemas
//!
//! # Example
//!
//! ```no_run
//! use csvw_annotator::{fetch, Annotator, UnitIndex};
//!
//! let units = UnitIndex::install_global(UnitIndex::new());
//! let annotator = Annotator::new(units);
//!
//! let source = fetch("file:///data/tensile_test.csv").unwrap();
//! let annotation = annotator.annotate(&source).unwrap();
//!
//! println!("{}", annotation.filename);
//! println!("Tables: {}", annotation.document.tables.len());
//! ```

pub mod error;
pub mod extract;
pub mod inference;
pub mod input;
pub mod schema;
pub mod structure;

mod annotator;

pub use crate::annotator::{
    Annotator, AnnotatorConfig, DelimiterChoice, EncodingChoice, DEFAULT_SAMPLE_BYTES,
};
pub use error::{AnnotatorError, Result};
pub use extract::{DataTable, HeaderBlock};
pub use inference::{classify, CellType, UnitBinding, UnitIndex, UnitLookup, UnitResolver, Xsd};
pub use input::{fetch, SourceFile};
pub use schema::{AnnotatedDocument, Annotation};
pub use structure::{Delimiter, Segment, SegmentKind};
