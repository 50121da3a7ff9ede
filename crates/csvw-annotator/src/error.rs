//! Error types for the annotator library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for annotation operations.
///
/// Only the encoding and delimiter variants are fatal to a whole
/// [`Annotator::process`](crate::Annotator::process) call. Region-level
/// failures are logged and the region is left out of the document.
#[derive(Debug, Error)]
pub enum AnnotatorError {
    /// No encoding could be detected for the raw bytes.
    #[error("cannot determine encoding, please select manually")]
    UnresolvableEncoding,

    /// A declared encoding label is not known to the decoder.
    #[error("unknown encoding '{0}'")]
    UnknownEncoding(String),

    /// No delimiter could be found anywhere in the file.
    #[error("cannot find separator, please select manually")]
    UnresolvableDelimiter,

    /// A caller-supplied delimiter pattern is not usable.
    #[error("invalid delimiter: {0}")]
    InvalidDelimiter(String),

    /// A region parsed into nothing.
    #[error("region {start}..{end} contains no usable rows")]
    EmptySegment { start: usize, end: usize },

    /// A region could not be parsed structurally.
    #[error("malformed region {start}..{end}: {message}")]
    MalformedRegion {
        start: usize,
        end: usize,
        message: String,
    },

    /// The source could not be fetched.
    #[error("cannot fetch '{location}': {message}")]
    Fetch { location: String, message: String },

    /// Error reading a local file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnnotatorError {
    /// Whether this error aborts a whole `process` call.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            AnnotatorError::EmptySegment { .. } | AnnotatorError::MalformedRegion { .. }
        )
    }
}

/// Result type alias for annotation operations.
pub type Result<T> = std::result::Result<T, AnnotatorError>;
