//! Raw input files and the fetch collaborator.

use std::path::{Path, PathBuf};

use reqwest::Url;
use tracing::info;

use crate::error::{AnnotatorError, Result};

/// Raw bytes of a file to annotate, plus where they came from.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// File name without path (e.g. "tensile_test.csv").
    pub name: String,
    /// Location the bytes were read from; used as the document `url`.
    pub url: Option<String>,
    /// Undecoded file contents.
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// Wrap in-memory bytes.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            url: None,
            bytes: bytes.into(),
        }
    }

    /// Attach the location the bytes came from.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Read a local file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| AnnotatorError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            url: Some(format!("file://{}", path.display())),
            bytes,
        })
    }

    /// The `url` value written into the document.
    pub fn document_url(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.name)
    }

    /// Suggested name for the generated metadata file.
    pub fn metadata_file_name(&self) -> String {
        let stem = self.name.split('.').next().unwrap_or_default();
        format!("{}-metadata.json", stem)
    }
}

/// Fetch a file from an `http(s)://` or `file://` URL, or a plain path.
pub fn fetch(location: &str) -> Result<SourceFile> {
    let fetch_error = |message: String| AnnotatorError::Fetch {
        location: location.to_string(),
        message,
    };

    let url = match Url::parse(location) {
        Ok(url) => url,
        // Not a URL at all: treat as a local path
        Err(_) => return SourceFile::from_path(location),
    };

    match url.scheme() {
        "http" | "https" => {
            info!(url = location, "fetching remote file");
            let response = reqwest::blocking::get(url.clone())
                .and_then(|r| r.error_for_status())
                .map_err(|e| fetch_error(e.to_string()))?;
            let bytes = response.bytes().map_err(|e| fetch_error(e.to_string()))?;

            Ok(SourceFile {
                name: file_name_from_url(&url),
                url: Some(location.to_string()),
                bytes: bytes.to_vec(),
            })
        }
        "file" => {
            let path: PathBuf = url
                .to_file_path()
                .map_err(|_| fetch_error("not a local file path".to_string()))?;
            Ok(SourceFile::from_path(&path)?.with_url(location))
        }
        // Windows drive letters parse as a one-letter scheme
        scheme if scheme.len() == 1 => SourceFile::from_path(location),
        scheme => Err(fetch_error(format!("unknown scheme '{}'", scheme))),
    }
}

/// Last path segment of a URL, ignoring a trailing `/download/upload`.
fn file_name_from_url(url: &Url) -> String {
    let path = url.path();
    let path = path.split("/download/upload").next().unwrap_or(path);
    path.rsplit('/').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_metadata_file_name() {
        let source = SourceFile::new("tensile_test.csv", b"a;b".to_vec());
        assert_eq!(source.metadata_file_name(), "tensile_test-metadata.json");
        assert_eq!(source.document_url(), "tensile_test.csv");
    }

    #[test]
    fn test_file_name_from_url() {
        let url = Url::parse("https://example.org/data/run1.txt").unwrap();
        assert_eq!(file_name_from_url(&url), "run1.txt");

        let url = Url::parse("https://cloud.example.org/s/run2.csv/download/upload").unwrap();
        assert_eq!(file_name_from_url(&url), "run2.csv");
    }

    #[test]
    fn test_fetch_local_path_and_file_url() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"x;y\n1;2\n").unwrap();

        let source = fetch(&file.path().display().to_string()).unwrap();
        assert_eq!(source.bytes, b"x;y\n1;2\n");

        let url = format!("file://{}", file.path().display());
        let source = fetch(&url).unwrap();
        assert_eq!(source.url.as_deref(), Some(url.as_str()));
    }

    #[test]
    fn test_fetch_unknown_scheme() {
        let err = fetch("ftp://example.org/file.csv").unwrap_err();
        assert!(matches!(err, AnnotatorError::Fetch { .. }));
    }

    #[test]
    fn test_fetch_missing_file() {
        let err = fetch("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, AnnotatorError::Io { .. }));
    }
}
