//! Byte encoding detection and decoding.

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AnnotatorError, Result};

/// An encoding guessed from raw bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEncoding {
    /// Encoding name as reported downstream (e.g. "utf-8", "latin-1").
    pub name: String,
    /// Detector confidence (0.0-1.0).
    pub confidence: f32,
}

/// Guess the encoding of a raw byte buffer.
///
/// Returns `None` when nothing plausible is found; callers must then fail
/// with [`AnnotatorError::UnresolvableEncoding`] instead of assuming UTF-8.
pub fn detect_encoding(bytes: &[u8]) -> Option<DetectedEncoding> {
    if bytes.is_empty() {
        return None;
    }

    let (charset, confidence, _language) = chardet::detect(bytes);
    if charset.is_empty() {
        return None;
    }

    // Downstream decoding knows ISO-8859-1 under its latin-1 alias
    let name = if charset.eq_ignore_ascii_case("ISO-8859-1") {
        "latin-1".to_string()
    } else {
        charset
    };

    debug!(encoding = %name, confidence, "detected encoding");
    Some(DetectedEncoding { name, confidence })
}

/// Resolve an encoding name to a decoder.
fn lookup(name: &str) -> Option<&'static Encoding> {
    let label = name.trim().to_ascii_lowercase();
    match label.as_str() {
        // ASCII is a strict subset of UTF-8; the WHATWG "ascii" label would
        // otherwise map to windows-1252
        "ascii" | "us-ascii" | "utf-8" | "utf8" => Some(encoding_rs::UTF_8),
        "latin-1" | "latin_1" => Encoding::for_label(b"latin1"),
        _ => Encoding::for_label(label.as_bytes())
            .or_else(|| Encoding::for_label(chardet::charset2encoding(&label).as_bytes())),
    }
}

/// Decode bytes with the named encoding.
///
/// A leading byte order mark takes precedence over the declared name.
pub fn decode(bytes: &[u8], name: &str) -> Result<String> {
    let encoding = lookup(name).ok_or_else(|| AnnotatorError::UnknownEncoding(name.to_string()))?;
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(
            declared = name,
            used = used.name(),
            "input contained bytes invalid for the encoding, replaced"
        );
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_ascii_text() {
        let detected = detect_encoding(b"a;b;c\n1;2;3\n").unwrap();
        assert!(lookup(&detected.name).is_some());
    }

    #[test]
    fn test_detect_empty_is_none() {
        assert!(detect_encoding(b"").is_none());
    }

    #[test]
    fn test_decode_latin1_umlauts() {
        // "Länge" in ISO-8859-1
        let bytes = b"L\xe4nge;5";
        assert_eq!(decode(bytes, "latin-1").unwrap(), "L\u{e4}nge;5");
        assert_eq!(decode(bytes, "ISO-8859-1").unwrap(), "L\u{e4}nge;5");
    }

    #[test]
    fn test_decode_utf8_strips_bom() {
        let bytes = b"\xef\xbb\xbfid,value\n";
        assert_eq!(decode(bytes, "utf-8").unwrap(), "id,value\n");
    }

    #[test]
    fn test_decode_unknown_label() {
        let err = decode(b"abc", "no-such-encoding").unwrap_err();
        assert!(matches!(err, AnnotatorError::UnknownEncoding(_)));
    }
}
