//! Partitioning of a decoded file into delimiter-homogeneous regions.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::delimiter::{sniff_line, Delimiter, Signature};
use crate::inference::is_header_row;

/// What a region of the file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Neither metadata nor a table; left out of the output.
    Unknown,
    /// Key/value annotations.
    Meta,
    /// A table with (possibly zero) header rows.
    Data,
}

/// A contiguous run of lines `[start, end)` sharing one delimiter signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    /// `None` when no line of the run has any candidate delimiter.
    pub delimiter: Option<Delimiter>,
    pub field_count: usize,
    pub kind: SegmentKind,
}

impl Segment {
    fn open(start: usize, end: usize, signature: Option<&Signature>) -> Self {
        Self {
            start,
            end,
            delimiter: signature.map(|s| s.delimiter.clone()),
            field_count: signature.map(Signature::field_count).unwrap_or(0),
            kind: SegmentKind::Unknown,
        }
    }

    /// Number of lines covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The equality key used for merging.
    pub fn signature(&self) -> Option<Signature> {
        self.delimiter
            .as_ref()
            .map(|d| Signature::new(d.clone(), self.field_count.saturating_sub(1)))
    }

    /// Whether the region takes part in the output.
    pub fn is_classified(&self) -> bool {
        self.kind != SegmentKind::Unknown
    }
}

/// Line-by-line scanner over one decoded file.
///
/// Holds only borrowed lines; a fresh segmenter is built per file.
#[derive(Debug, Clone)]
pub struct Segmenter<'a> {
    lines: Vec<&'a str>,
}

impl<'a> Segmenter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
        }
    }

    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    /// Scan, merge and classify in one go.
    ///
    /// The result tiles `[0, lines)` completely; unknown regions are kept
    /// in the list so callers can inspect them.
    pub fn segment(&self) -> Vec<Segment> {
        let mut segments = Self::merge(self.scan());
        for segment in &mut segments {
            segment.kind = self.classify(segment);
            debug!(
                start = segment.start,
                end = segment.end,
                delimiter = segment.delimiter.as_ref().map(|d| d.pattern()),
                fields = segment.field_count,
                kind = ?segment.kind,
                "segment"
            );
        }
        segments
    }

    /// Forward scan: close a run whenever a line's signature differs from
    /// the last seen one.
    ///
    /// Blank lines extend the current run. A non-blank line without any
    /// delimiter closes a delimited run and opens an undelimited one, which
    /// in turn closes at the next delimited line.
    pub fn scan(&self) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut previous: Option<Signature> = None;
        let mut undelimited = false;
        let mut start = 0;

        for (i, line) in self.lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            match sniff_line(line) {
                None => {
                    if let Some(prev) = previous.take() {
                        segments.push(Segment::open(start, i, Some(&prev)));
                        start = i;
                    }
                    undelimited = true;
                }
                Some(current) => {
                    let changed = match &previous {
                        Some(prev) => *prev != current,
                        None => undelimited,
                    };
                    if changed {
                        segments.push(Segment::open(start, i, previous.as_ref()));
                        start = i;
                    }
                    previous = Some(current);
                    undelimited = false;
                }
            }
        }

        if start < self.lines.len() {
            segments.push(Segment::open(start, self.lines.len(), previous.as_ref()));
        }
        segments
    }

    /// The whole file as one classified region with a known delimiter.
    pub fn whole(&self, delimiter: Delimiter) -> Segment {
        let count = self
            .lines
            .iter()
            .find(|l| !l.trim().is_empty())
            .map(|l| delimiter.count_in(l))
            .unwrap_or(0);
        let mut segment = Segment::open(
            0,
            self.lines.len(),
            Some(&Signature::new(delimiter, count)),
        );
        segment.kind = self.classify(&segment);
        segment
    }

    /// Join consecutive segments with identical signatures.
    pub fn merge(segments: Vec<Segment>) -> Vec<Segment> {
        let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
        for segment in segments {
            match merged.last_mut() {
                Some(last)
                    if last.delimiter == segment.delimiter
                        && last.field_count == segment.field_count =>
                {
                    last.end = segment.end;
                }
                _ => merged.push(segment),
            }
        }
        merged
    }

    /// Decide between meta, data and unknown for one merged region.
    pub fn classify(&self, segment: &Segment) -> SegmentKind {
        let Some(delimiter) = &segment.delimiter else {
            return SegmentKind::Unknown;
        };

        let mut content = self.lines[segment.start..segment.end]
            .iter()
            .filter(|l| !l.trim().is_empty());
        let Some(first) = content.next() else {
            return SegmentKind::Unknown;
        };

        if delimiter.is_config_style() || content.next().is_none() {
            return SegmentKind::Meta;
        }

        match delimiter.splitter() {
            Ok(splitter) if is_header_row(splitter.split(first)) => SegmentKind::Data,
            _ => SegmentKind::Unknown,
        }
    }
}

/// Segment a decoded file.
pub fn segment(text: &str) -> Vec<Segment> {
    Segmenter::new(text).segment()
}
