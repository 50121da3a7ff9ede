//! File structure recovery: delimiters and region boundaries.

mod delimiter;
mod segmenter;

pub use delimiter::{sniff_line, sniff_sample, Delimiter, Signature, Splitter};
pub use segmenter::{segment, Segment, SegmentKind, Segmenter};
