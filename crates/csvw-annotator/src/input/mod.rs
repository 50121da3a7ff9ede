//! Raw input handling: fetching, encoding detection and decoding.

mod encoding;
mod source;

pub use encoding::{decode, detect_encoding, DetectedEncoding};
pub use source::{fetch, SourceFile};
