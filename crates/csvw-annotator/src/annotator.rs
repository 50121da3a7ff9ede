//! Main Annotator struct and public API.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AnnotatorError, Result};
use crate::extract::{MetaExtractor, TableExtractor};
use crate::inference::{UnitIndex, UnitLookup, UnitResolver};
use crate::input::{decode, detect_encoding, SourceFile};
use crate::schema::{AnnotatedDocument, Annotation, Note, Serializer, Table};
use crate::structure::{sniff_sample, Delimiter, Segment, SegmentKind, Segmenter};

/// Default tail size for sampled-row delimiter sniffing.
pub const DEFAULT_SAMPLE_BYTES: usize = 2048;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Caller choice for a delimiter: resolve it, or use the given one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DelimiterChoice {
    #[default]
    Auto,
    Fixed(Delimiter),
}

impl DelimiterChoice {
    pub fn fixed(&self) -> Option<&Delimiter> {
        match self {
            DelimiterChoice::Auto => None,
            DelimiterChoice::Fixed(d) => Some(d),
        }
    }
}

impl FromStr for DelimiterChoice {
    type Err = AnnotatorError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("auto") {
            Ok(DelimiterChoice::Auto)
        } else {
            Delimiter::parse(s).map(DelimiterChoice::Fixed)
        }
    }
}

impl From<DelimiterChoice> for String {
    fn from(choice: DelimiterChoice) -> Self {
        match choice {
            DelimiterChoice::Auto => "auto".to_string(),
            DelimiterChoice::Fixed(d) => d.into(),
        }
    }
}

impl TryFrom<String> for DelimiterChoice {
    type Error = AnnotatorError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Caller choice for the byte encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EncodingChoice {
    #[default]
    Auto,
    Named(String),
}

impl From<String> for EncodingChoice {
    fn from(value: String) -> Self {
        if value.trim().is_empty() || value.eq_ignore_ascii_case("auto") {
            EncodingChoice::Auto
        } else {
            EncodingChoice::Named(value)
        }
    }
}

impl From<&str> for EncodingChoice {
    fn from(value: &str) -> Self {
        EncodingChoice::from(value.to_string())
    }
}

impl From<EncodingChoice> for String {
    fn from(choice: EncodingChoice) -> Self {
        match choice {
            EncodingChoice::Auto => "auto".to_string(),
            EncodingChoice::Named(name) => name,
        }
    }
}

/// Configuration for one annotation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatorConfig {
    pub encoding: EncodingChoice,
    /// Delimiter of data regions.
    pub delimiter: DelimiterChoice,
    /// Delimiter of meta regions.
    pub header_delimiter: DelimiterChoice,
    /// Tail size for sampled-row sniffing.
    pub sample_bytes: usize,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            encoding: EncodingChoice::Auto,
            delimiter: DelimiterChoice::Auto,
            header_delimiter: DelimiterChoice::Auto,
            sample_bytes: DEFAULT_SAMPLE_BYTES,
        }
    }
}

impl AnnotatorConfig {
    pub fn with_encoding(mut self, encoding: impl Into<EncodingChoice>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: DelimiterChoice) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header_delimiter(mut self, delimiter: DelimiterChoice) -> Self {
        self.header_delimiter = delimiter;
        self
    }
}

// =============================================================================
// ANNOTATOR
// =============================================================================

/// The annotation engine.
///
/// Holds no per-file state; one instance may process any number of files,
/// and instances sharing a unit index may run on separate threads.
#[derive(Debug, Clone)]
pub struct Annotator {
    config: AnnotatorConfig,
    serializer: Serializer,
}

impl Annotator {
    /// Create an annotator querying the given unit index.
    pub fn new(units: Arc<dyn UnitLookup>) -> Self {
        Self {
            config: AnnotatorConfig::default(),
            serializer: Serializer::new(UnitResolver::new(units)),
        }
    }

    pub fn with_config(mut self, config: AnnotatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Annotate a file and name the metadata file after it.
    pub fn annotate(&self, source: &SourceFile) -> Result<Annotation> {
        Ok(Annotation {
            filename: source.metadata_file_name(),
            document: self.process(source)?,
        })
    }

    /// Decode, segment and describe one file.
    ///
    /// Fails when the encoding or the delimiter of the whole file cannot be
    /// resolved, or when a configured delimiter is unusable. Regions that
    /// fail to parse are logged and left out.
    pub fn process(&self, source: &SourceFile) -> Result<AnnotatedDocument> {
        let encoding = self.resolve_encoding(&source.bytes)?;
        let text = decode(&source.bytes, &encoding)?;
        let segmenter = Segmenter::new(&text);
        let segments = self.resolve_segments(&segmenter, &text)?;

        let url = source.document_url();
        let mut document = AnnotatedDocument::new(url);
        for segment in &segments {
            match segment.kind {
                SegmentKind::Meta => match self.meta_notes(&segmenter, &text, segment) {
                    Ok(notes) => document.notes.extend(notes),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => warn!(start = segment.start, end = segment.end, error = %e, "skipping meta region"),
                },
                SegmentKind::Data => match self.data_table(&segmenter, segment, url, &encoding) {
                    Ok(table) => document.tables.push(table),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => warn!(start = segment.start, end = segment.end, error = %e, "skipping data region"),
                },
                SegmentKind::Unknown => {
                    debug!(start = segment.start, end = segment.end, "dropping unclassified region")
                }
            }
        }

        info!(
            file = %source.name,
            encoding = %encoding,
            lines = segmenter.lines().len(),
            notes = document.notes.len(),
            tables = document.tables.len(),
            "annotated file"
        );
        Ok(document)
    }

    /// Segmentation of a file, as used by [`Annotator::process`].
    pub fn segments(&self, source: &SourceFile) -> Result<Vec<Segment>> {
        let encoding = self.resolve_encoding(&source.bytes)?;
        let text = decode(&source.bytes, &encoding)?;
        self.resolve_segments(&Segmenter::new(&text), &text)
    }

    fn resolve_encoding(&self, bytes: &[u8]) -> Result<String> {
        match &self.config.encoding {
            EncodingChoice::Named(name) => Ok(name.clone()),
            EncodingChoice::Auto => detect_encoding(bytes)
                .map(|d| d.name)
                .ok_or(AnnotatorError::UnresolvableEncoding),
        }
    }

    /// Segments of the file; when no line has any candidate delimiter, the
    /// whole file becomes one region with a sampled or configured delimiter.
    fn resolve_segments(&self, segmenter: &Segmenter<'_>, text: &str) -> Result<Vec<Segment>> {
        let segments = segmenter.segment();
        if segments.iter().any(|s| s.delimiter.is_some()) {
            return Ok(segments);
        }

        let delimiter = match self.config.delimiter.fixed() {
            Some(d) => d.clone(),
            None => sniff_sample(text, None, self.config.sample_bytes)
                .ok_or(AnnotatorError::UnresolvableDelimiter)?,
        };
        debug!(delimiter = %delimiter, "no line delimiter found, reading file as one region");
        Ok(vec![segmenter.whole(delimiter)])
    }

    fn meta_notes(&self, segmenter: &Segmenter<'_>, text: &str, segment: &Segment) -> Result<Vec<Note>> {
        let lines = segmenter.lines();
        let delimiter = match self.config.header_delimiter.fixed() {
            Some(d) => d.clone(),
            None => {
                // Meta lines may split differently than their run signature
                let last_row = lines
                    .get(segment.start..segment.end)
                    .and_then(|region| region.iter().rposition(|l| !l.trim().is_empty()))
                    .map(|offset| segment.start + offset);
                last_row
                    .and_then(|row| sniff_sample(text, Some(row), self.config.sample_bytes))
                    .or_else(|| segment.delimiter.clone())
                    .ok_or(AnnotatorError::EmptySegment {
                        start: segment.start,
                        end: segment.end,
                    })?
            }
        };

        let block = MetaExtractor::new(&delimiter)?.extract(lines, segment.start, segment.end)?;
        Ok(self.serializer.serialize_meta(&block))
    }

    fn data_table(
        &self,
        segmenter: &Segmenter<'_>,
        segment: &Segment,
        url: &str,
        encoding: &str,
    ) -> Result<Table> {
        let delimiter = self
            .config
            .delimiter
            .fixed()
            .or(segment.delimiter.as_ref())
            .ok_or(AnnotatorError::EmptySegment {
                start: segment.start,
                end: segment.end,
            })?;

        let table = TableExtractor::new(delimiter)?.extract(segmenter.lines(), segment.start, segment.end)?;
        Ok(self.serializer.table(&table, url, delimiter, encoding))
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(Arc::new(UnitIndex::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotate(text: &str) -> AnnotatedDocument {
        let annotator = Annotator::default().with_config(AnnotatorConfig::default().with_encoding("utf-8"));
        annotator.process(&SourceFile::new("run.csv", text.as_bytes())).unwrap()
    }

    #[test]
    fn test_delimiter_choice_parse() {
        assert_eq!("auto".parse::<DelimiterChoice>().unwrap(), DelimiterChoice::Auto);
        assert_eq!(
            r"\t".parse::<DelimiterChoice>().unwrap(),
            DelimiterChoice::Fixed(Delimiter::Tab)
        );
        assert!("(".parse::<DelimiterChoice>().is_err());
    }

    #[test]
    fn test_encoding_choice() {
        assert_eq!(EncodingChoice::from("AUTO"), EncodingChoice::Auto);
        assert_eq!(
            EncodingChoice::from("latin-1"),
            EncodingChoice::Named("latin-1".to_string())
        );
    }

    #[test]
    fn test_process_meta_and_table() {
        let doc = annotate("Operator: Jane Doe\nDate: 2020-01-01\nid;force\n1;2.5\n2;3.5\n");
        assert_eq!(doc.notes.len(), 2);
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.tables[0].dialect.skip_rows, 2);
        assert_eq!(doc.tables[0].dialect.encoding, "utf-8");
        assert_eq!(doc.url, "run.csv");
    }

    #[test]
    fn test_fixed_delimiter_overrides_data_regions() {
        let annotator = Annotator::default().with_config(
            AnnotatorConfig::default()
                .with_encoding("utf-8")
                .with_delimiter(DelimiterChoice::Fixed(Delimiter::Semicolon)),
        );
        let source = SourceFile::new("x.csv", b"a;b\n1.5;2\n2.5;3\n".to_vec());
        let doc = annotator.process(&source).unwrap();
        assert_eq!(doc.tables[0].dialect.delimiter, ";");
    }

    #[test]
    fn test_unusable_fixed_delimiter_is_fatal() {
        let annotator = Annotator::default().with_config(
            AnnotatorConfig::default()
                .with_encoding("utf-8")
                .with_delimiter(DelimiterChoice::Fixed(Delimiter::Pattern("(".to_string()))),
        );
        let err = annotator
            .process(&SourceFile::new("x.csv", b"a;b\n1.5;2\n2.5;3\n".to_vec()))
            .unwrap_err();
        assert!(matches!(err, AnnotatorError::InvalidDelimiter(_)));
    }

    #[test]
    fn test_empty_region_is_skipped() {
        // The one-line meta region has no value after its parameter
        let doc = annotate("Remarks|\nid;force\n1;2.5\n2;3.5\n");
        assert!(doc.notes.is_empty());
        assert_eq!(doc.tables.len(), 1);
    }

    #[test]
    fn test_space_separated_file_falls_back_to_sampling() {
        let doc = annotate("x y\n1.5 2.5\n3.5 4.5\n");
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.tables[0].dialect.delimiter, " +");
    }

    #[test]
    fn test_undelimited_file_is_fatal() {
        let annotator = Annotator::default().with_config(AnnotatorConfig::default().with_encoding("utf-8"));
        let err = annotator
            .process(&SourceFile::new("x.txt", b"abc\ndef\n".to_vec()))
            .unwrap_err();
        assert!(matches!(err, AnnotatorError::UnresolvableDelimiter));
        assert_eq!(err.to_string(), "cannot find separator, please select manually");
    }

    #[test]
    fn test_empty_input_has_no_encoding() {
        let err = Annotator::default()
            .process(&SourceFile::new("empty.csv", Vec::new()))
            .unwrap_err();
        assert!(matches!(err, AnnotatorError::UnresolvableEncoding));
    }

    #[test]
    fn test_annotation_file_name() {
        let annotation = Annotator::default()
            .annotate(&SourceFile::new("tensile.test.csv", b"a;b\n1.5;2\n".to_vec()))
            .unwrap();
        assert_eq!(annotation.filename, "tensile-metadata.json");
    }
}
