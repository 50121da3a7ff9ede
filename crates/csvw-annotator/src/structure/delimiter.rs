//! Field delimiter detection for single lines and sampled rows.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AnnotatorError, Result};

// =============================================================================
// DELIMITERS
// =============================================================================

/// Config-style `key:  value` separator: a colon run followed by whitespace.
const COLON_RUN_PATTERN: &str = r":+\s+\s*";

static COLON_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(COLON_RUN_PATTERN).unwrap());

/// Candidate delimiters, highest priority first. Ties in the whole-line
/// count go to the earlier entry.
static CANDIDATES: [Delimiter; 5] = [
    Delimiter::Semicolon,
    Delimiter::Pipe,
    Delimiter::ColonRun,
    Delimiter::Tab,
    Delimiter::Comma,
];

/// Preferred characters when guessing without a candidate set.
const PREFERRED: &[char] = &[',', '\t', ';', ' ', ':'];

/// A field delimiter, expressed as a regex pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Delimiter {
    Semicolon,
    Pipe,
    /// `key:  value` lines of config-style metadata blocks.
    ColonRun,
    Tab,
    Comma,
    /// Any other regex, e.g. a user-selected `\s+`.
    Pattern(String),
}

impl Delimiter {
    /// The built-in candidates in priority order.
    pub fn candidates() -> &'static [Delimiter] {
        &CANDIDATES
    }

    /// Parse a user-facing delimiter string (`";"`, `"\t"`, `"\s+"`, ...).
    pub fn parse(value: &str) -> Result<Self> {
        let delimiter = match value {
            ";" => Delimiter::Semicolon,
            "|" | r"\|" => Delimiter::Pipe,
            "\t" | r"\t" => Delimiter::Tab,
            "," => Delimiter::Comma,
            COLON_RUN_PATTERN => Delimiter::ColonRun,
            "" => return Err(AnnotatorError::InvalidDelimiter("empty pattern".to_string())),
            other => {
                Regex::new(other).map_err(|e| AnnotatorError::InvalidDelimiter(e.to_string()))?;
                Delimiter::Pattern(other.to_string())
            }
        };
        Ok(delimiter)
    }

    /// Delimiter for a single separator character.
    pub fn from_char(c: char) -> Self {
        match c {
            ';' => Delimiter::Semicolon,
            '|' => Delimiter::Pipe,
            '\t' => Delimiter::Tab,
            ',' => Delimiter::Comma,
            ' ' => Delimiter::Pattern(" +".to_string()),
            other => Delimiter::Pattern(regex::escape(&other.to_string())),
        }
    }

    /// The regex pattern, as written into the CSVW dialect.
    pub fn pattern(&self) -> &str {
        match self {
            Delimiter::Semicolon => ";",
            Delimiter::Pipe => r"\|",
            Delimiter::ColonRun => COLON_RUN_PATTERN,
            Delimiter::Tab => r"\t",
            Delimiter::Comma => ",",
            Delimiter::Pattern(p) => p,
        }
    }

    /// Whether this is the config-style colon separator.
    pub fn is_config_style(&self) -> bool {
        matches!(self, Delimiter::ColonRun)
    }

    /// The single byte this delimiter stands for, if it is one.
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            Delimiter::Semicolon => Some(b';'),
            Delimiter::Pipe => Some(b'|'),
            Delimiter::Tab => Some(b'\t'),
            Delimiter::Comma => Some(b','),
            Delimiter::ColonRun => None,
            Delimiter::Pattern(p) => literal_byte(p),
        }
    }

    /// Count non-overlapping occurrences in a line.
    pub fn count_in(&self, line: &str) -> usize {
        match self {
            Delimiter::Semicolon => line.matches(';').count(),
            Delimiter::Pipe => line.matches('|').count(),
            Delimiter::Tab => line.matches('\t').count(),
            Delimiter::Comma => line.matches(',').count(),
            Delimiter::ColonRun => COLON_RUN.find_iter(line).count(),
            Delimiter::Pattern(p) => Regex::new(p)
                .map(|re| re.find_iter(line).count())
                .unwrap_or(0),
        }
    }

    /// Build a reusable splitter.
    pub fn splitter(&self) -> Result<Splitter> {
        if let Some(byte) = self.as_byte() {
            return Ok(Splitter::Char(byte as char));
        }
        let regex = match self {
            Delimiter::ColonRun => COLON_RUN.clone(),
            other => Regex::new(other.pattern())
                .map_err(|e| AnnotatorError::InvalidDelimiter(e.to_string()))?,
        };
        Ok(Splitter::Regex(regex))
    }
}

/// The literal byte of a one-character (possibly escaped) pattern.
fn literal_byte(pattern: &str) -> Option<u8> {
    let bytes = pattern.as_bytes();
    match bytes {
        [b] if b.is_ascii_punctuation() && regex::escape(pattern) == pattern => Some(*b),
        [b' '] => Some(b' '),
        [b'\t'] => Some(b'\t'),
        [b'\\', b't'] => Some(b'\t'),
        [b'\\', b] if b.is_ascii_punctuation() => Some(*b),
        _ => None,
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

impl From<Delimiter> for String {
    fn from(d: Delimiter) -> Self {
        d.pattern().to_string()
    }
}

impl TryFrom<String> for Delimiter {
    type Error = AnnotatorError;

    fn try_from(value: String) -> Result<Self> {
        Delimiter::parse(&value)
    }
}

/// Compiled form of a [`Delimiter`] for repeated splitting.
#[derive(Debug, Clone)]
pub enum Splitter {
    Char(char),
    Regex(Regex),
}

impl Splitter {
    /// Split a line into raw (untrimmed) fields.
    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Splitter::Char(c) => line.split(*c).collect(),
            Splitter::Regex(re) => re.split(line).collect(),
        }
    }
}

// =============================================================================
// WHOLE-LINE MODE
// =============================================================================

/// Delimiter signature of a line: the winning delimiter and its match count.
///
/// Adjacent lines with equal signatures belong to the same segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub delimiter: Delimiter,
    /// Number of delimiter matches in the line.
    pub count: usize,
}

impl Signature {
    pub fn new(delimiter: Delimiter, count: usize) -> Self {
        Self { delimiter, count }
    }

    /// Fields a line with this signature splits into.
    pub fn field_count(&self) -> usize {
        self.count + 1
    }
}

/// Pick the delimiter of a single decoded line.
///
/// The candidate with the most matches wins. A winning comma yields to the
/// runner-up when that one has at most one match fewer, so that a line of
/// German decimals like `1,5;2,3;7,1` resolves to `;`. Returns `None` when no
/// candidate occurs at all.
pub fn sniff_line(line: &str) -> Option<Signature> {
    let line = line.trim_end();
    let counts: Vec<(&Delimiter, usize)> = CANDIDATES.iter().map(|d| (d, d.count_in(line))).collect();

    let (best, best_count) = first_max(counts.iter().copied())?;
    if best_count == 0 {
        return None;
    }

    if *best == Delimiter::Comma {
        let runner_up = first_max(counts.iter().copied().filter(|(d, _)| **d != Delimiter::Comma));
        if let Some((second, second_count)) = runner_up {
            if second_count > 0 && second_count + 1 >= best_count {
                return Some(Signature::new(second.clone(), second_count));
            }
        }
    }

    Some(Signature::new(best.clone(), best_count))
}

/// Highest count, keeping the earliest entry on ties.
fn first_max<'a>(
    counts: impl Iterator<Item = (&'a Delimiter, usize)>,
) -> Option<(&'a Delimiter, usize)> {
    counts.fold(None, |best, (d, c)| match best {
        Some((_, best_count)) if best_count >= c => best,
        _ => Some((d, c)),
    })
}

// =============================================================================
// SAMPLED-ROW MODE
// =============================================================================

/// Guess the delimiter of one sampled row of the decoded file.
///
/// With `row` set, that line is sampled; otherwise the last non-blank line
/// within the final `tail_bytes` bytes is. Candidates are tried first; if
/// none occurs, any punctuation character with a consistent count is
/// accepted instead, preferring the usual separators.
pub fn sniff_sample(text: &str, row: Option<usize>, tail_bytes: usize) -> Option<Delimiter> {
    let sample = [sample_line(text, row, tail_bytes)?];

    let constrained = CANDIDATES
        .iter()
        .filter_map(|d| consistent_count(&sample, |line| d.count_in(line)).map(|c| (d, c)));
    if let Some((delimiter, _)) = first_max(constrained) {
        return Some(delimiter.clone());
    }

    guess_unconstrained(&sample).map(Delimiter::from_char)
}

fn sample_line(text: &str, row: Option<usize>, tail_bytes: usize) -> Option<&str> {
    let line = match row {
        Some(row) => text.lines().nth(row)?,
        None => {
            let mut start = text.len().saturating_sub(tail_bytes);
            while !text.is_char_boundary(start) {
                start += 1;
            }
            text[start..].lines().rev().find(|l| !l.trim().is_empty())?
        }
    };
    let line = line.trim_end();
    (!line.is_empty()).then_some(line)
}

/// The per-line count shared by at least 90% of the sampled lines, if non-zero.
fn consistent_count(lines: &[&str], count: impl Fn(&str) -> usize) -> Option<usize> {
    let counts: Vec<usize> = lines.iter().map(|l| count(l)).collect();

    let mut mode = 0;
    let mut mode_freq = 0;
    for &candidate in &counts {
        let freq = counts.iter().filter(|&&c| c == candidate).count();
        if freq > mode_freq || (freq == mode_freq && candidate > mode) {
            mode = candidate;
            mode_freq = freq;
        }
    }

    let ratio = mode_freq as f64 / counts.len() as f64;
    (mode > 0 && ratio >= 0.9).then_some(mode)
}

fn guess_unconstrained(lines: &[&str]) -> Option<char> {
    let mut chars: Vec<char> = lines
        .iter()
        .flat_map(|l| l.chars())
        .filter(|c| is_separator_like(*c))
        .collect();
    chars.sort_unstable();
    chars.dedup();

    let consistent: Vec<(char, usize)> = chars
        .into_iter()
        .filter_map(|c| consistent_count(lines, |line| line.matches(c).count()).map(|n| (c, n)))
        .collect();

    if let Some(&c) = PREFERRED.iter().find(|p| consistent.iter().any(|(c, _)| c == *p)) {
        return Some(c);
    }
    consistent
        .into_iter()
        .max_by_key(|&(_, n)| n)
        .map(|(c, _)| c)
}

fn is_separator_like(c: char) -> bool {
    (c.is_ascii_punctuation() || c == ' ' || c == '\t')
        && !matches!(c, '"' | '\'' | '.' | '-' | '+' | '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_line_semicolon() {
        let sig = sniff_line("a;b;c").unwrap();
        assert_eq!(sig.delimiter, Delimiter::Semicolon);
        assert_eq!(sig.count, 2);
        assert_eq!(sig.field_count(), 3);
    }

    #[test]
    fn test_sniff_line_decimal_comma_tie_break() {
        let sig = sniff_line("1,5;2,3;7,1").unwrap();
        assert_eq!(sig.delimiter, Delimiter::Semicolon);
        assert_eq!(sig.count, 2);
    }

    #[test]
    fn test_sniff_line_comma_wins_without_runner_up() {
        let sig = sniff_line("x,y").unwrap();
        assert_eq!(sig.delimiter, Delimiter::Comma);
        assert_eq!(sig.count, 1);
    }

    #[test]
    fn test_sniff_line_comma_far_ahead() {
        let sig = sniff_line("a,b,c,d;e").unwrap();
        assert_eq!(sig.delimiter, Delimiter::Comma);
    }

    #[test]
    fn test_sniff_line_config_style() {
        let sig = sniff_line("Operator:   Jane Doe").unwrap();
        assert_eq!(sig.delimiter, Delimiter::ColonRun);
        assert_eq!(sig.count, 1);
    }

    #[test]
    fn test_sniff_line_priority_on_ties() {
        // one of each: ';' comes first in priority order
        let sig = sniff_line("a;b\tc").unwrap();
        assert_eq!(sig.delimiter, Delimiter::Semicolon);
    }

    #[test]
    fn test_sniff_line_none() {
        assert!(sniff_line("just some words").is_none());
        assert!(sniff_line("").is_none());
        // trailing whitespace is not a delimiter
        assert!(sniff_line("value:   ").is_none());
    }

    #[test]
    fn test_sniff_sample_tail() {
        let text = "Title: run 4\n\nt;F;s\n0;1,5;0,1\n1;2,5;0,2\n2;3,5;0,3\n\n";
        assert_eq!(sniff_sample(text, None, 2048), Some(Delimiter::Semicolon));
        // tail cut inside a multi-byte character
        let text = "\u{e4}\u{e4}\u{e4}|x\na|b\n";
        assert_eq!(sniff_sample(text, None, 8), Some(Delimiter::Pipe));
    }

    #[test]
    fn test_sniff_sample_row() {
        let text = "a|b|c\nOperator: Jane\n";
        assert_eq!(sniff_sample(text, Some(0), 2048), Some(Delimiter::Pipe));
        assert_eq!(sniff_sample(text, Some(1), 2048), Some(Delimiter::ColonRun));
        assert_eq!(sniff_sample(text, Some(7), 2048), None);
    }

    #[test]
    fn test_sniff_sample_unconstrained_space() {
        let text = "1 2 3\n4 5 6\n7 8 9\n";
        assert_eq!(
            sniff_sample(text, None, 2048),
            Some(Delimiter::Pattern(" +".to_string()))
        );
    }

    #[test]
    fn test_sniff_sample_nothing() {
        assert_eq!(sniff_sample("abc\ndef\n", None, 2048), None);
        assert_eq!(sniff_sample("", None, 2048), None);
    }

    #[test]
    fn test_parse_and_pattern() {
        assert_eq!(Delimiter::parse(r"\t").unwrap(), Delimiter::Tab);
        assert_eq!(Delimiter::parse("|").unwrap(), Delimiter::Pipe);
        assert_eq!(Delimiter::parse(r":+\s+\s*").unwrap(), Delimiter::ColonRun);
        assert_eq!(Delimiter::Pipe.pattern(), r"\|");

        let ws = Delimiter::parse(r"\s+").unwrap();
        assert_eq!(ws, Delimiter::Pattern(r"\s+".to_string()));
        assert_eq!(ws.as_byte(), None);

        assert!(Delimiter::parse("(").is_err());
        assert_eq!(Delimiter::parse(":").unwrap().as_byte(), Some(b':'));
    }

    #[test]
    fn test_splitter() {
        let fields = Delimiter::ColonRun.splitter().unwrap().split("Speed:  5 m/s");
        assert_eq!(fields, vec!["Speed", "5 m/s"]);

        let fields = Delimiter::Tab.splitter().unwrap().split("a\tb\t");
        assert_eq!(fields, vec!["a", "b", ""]);
    }

    #[test]
    fn test_serde_as_pattern() {
        let json = serde_json::to_string(&Delimiter::Tab).unwrap();
        assert_eq!(json, r#""\\t""#);
        let back: Delimiter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Delimiter::Tab);
    }
}
