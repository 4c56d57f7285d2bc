//! Upload sources: a closed union of the two ways a file can arrive.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::IngestError;
use crate::mime_table::MimeTable;

/// A file already materialized on the local filesystem, with the metadata its
/// uploader claimed for it. Only `size` is trusted by validation (and it is checked
/// against the filesystem); the declared name and MIME type never are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFile {
    pub path: PathBuf,
    pub declared_name: String,
    pub declared_mime_type: String,
    pub size: u64,
}

impl LocalFile {
    pub fn new(
        path: impl Into<PathBuf>,
        declared_name: impl Into<String>,
        declared_mime_type: impl Into<String>,
        size: u64,
    ) -> Self {
        Self {
            path: path.into(),
            declared_name: declared_name.into(),
            declared_mime_type: declared_mime_type.into(),
            size,
        }
    }

    /// Describes an existing file using filesystem metadata. The declared MIME type is
    /// guessed from the extension; validation re-detects it from content regardless.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path)
            .map_err(|e| IngestError::InvalidFile(format!("{}: {}", path.display(), e)))?;
        if !meta.is_file() {
            return Err(IngestError::InvalidFile(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let declared_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let declared_mime_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| MimeTable::standard().mime_for_extension(e))
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(Self {
            path: path.to_path_buf(),
            declared_name,
            declared_mime_type,
            size: meta.len(),
        })
    }
}

/// Exactly one of a local file or a remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadSource {
    LocalFile(LocalFile),
    RemoteUrl { url: String },
}

impl UploadSource {
    pub fn remote(url: impl Into<String>) -> Self {
        UploadSource::RemoteUrl { url: url.into() }
    }

    /// Classifies an untyped string once: an absolute http(s) URL becomes `RemoteUrl`,
    /// a path to an existing regular file becomes `LocalFile`, anything else is rejected.
    pub fn classify(raw: &str) -> Result<Self, IngestError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IngestError::InvalidSource("empty source".to_string()));
        }

        if let Ok(parsed) = url::Url::parse(trimmed) {
            if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() {
                return Ok(UploadSource::remote(trimmed));
            }
        }

        let path = Path::new(trimmed);
        if path.is_file() {
            return LocalFile::from_path(path).map(UploadSource::LocalFile);
        }

        Err(IngestError::InvalidSource(trimmed.to_string()))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, UploadSource::RemoteUrl { .. })
    }
}
