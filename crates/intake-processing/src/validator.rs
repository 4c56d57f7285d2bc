use intake_core::{
    FileTypeCategory, IngestError, IngestResult, LocalFile, MimeTable, UploaderConfig,
};
use std::sync::Arc;
use url::Url;

use crate::fetch::HttpFetcher;
use crate::sniff;

/// Text types that stand in for each other, with their extensions.
const TEXT_TYPES: [(&str, &str); 2] = [("text/plain", "txt"), ("text/csv", "csv")];

/// A local file that passed validation, with everything needed to store it.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub bytes: Vec<u8>,
    /// Detected from content, canonical
    pub mime_type: String,
    /// Canonical extension of `mime_type`
    pub extension: String,
    pub category: FileTypeCategory,
}

/// Upload validator
///
/// Enforces the category policy (allowed types and size ceiling) against what the
/// content actually is. Declared MIME types are never trusted.
#[derive(Clone)]
pub struct Validator {
    config: Arc<UploaderConfig>,
    table: MimeTable,
    fetcher: HttpFetcher,
}

impl Validator {
    pub fn new(config: Arc<UploaderConfig>, fetcher: HttpFetcher) -> Self {
        Self {
            config,
            table: MimeTable::standard(),
            fetcher,
        }
    }

    pub fn mime_table(&self) -> &MimeTable {
        &self.table
    }

    pub fn resolve_category(&self, name: &str) -> IngestResult<&FileTypeCategory> {
        self.config
            .category(name)
            .ok_or_else(|| IngestError::UnknownCategory(name.to_string()))
    }

    pub fn category_config(&self, name: &str) -> IngestResult<FileTypeCategory> {
        self.resolve_category(name).cloned()
    }

    pub fn detect_mime_type(&self, data: &[u8]) -> IngestResult<String> {
        sniff::detect_mime(data)
    }

    /// Effective ceiling in bytes: the override when given, else the category maximum.
    pub fn ceiling(category: &FileTypeCategory, max_size_override: Option<u64>) -> u64 {
        max_size_override.unwrap_or_else(|| category.max_size_bytes())
    }

    pub fn check_size(actual_bytes: u64, ceiling_bytes: u64) -> IngestResult<()> {
        if actual_bytes > ceiling_bytes {
            return Err(IngestError::size_exceeded(ceiling_bytes));
        }
        Ok(())
    }

    /// Returns the MIME type to record for `detected` under `category`. Plain text and
    /// CSV have no magic bytes and are told apart heuristically, so either is accepted
    /// where the category only allows the other.
    pub fn check_mime_allowed(
        &self,
        detected: &str,
        category: &FileTypeCategory,
    ) -> IngestResult<String> {
        let detected = self.table.canonicalize(detected);
        let allowed = self.table.mimes_for_extensions(&category.mimes);
        if allowed.iter().any(|mime| *mime == detected) {
            return Ok(detected);
        }

        if TEXT_TYPES.iter().any(|(mime, _)| *mime == detected) {
            if let Some((mime, _)) = TEXT_TYPES
                .iter()
                .find(|(_, extension)| category.allows_extension(extension))
            {
                return Ok(mime.to_string());
            }
        }

        tracing::debug!(
            detected_mime = %detected,
            category = %category.name,
            allowed = ?allowed,
            "Detected MIME type not allowed for category"
        );
        Err(IngestError::InvalidMimeType(detected))
    }

    /// Validates a local file against `category_name`. Nothing is written.
    #[tracing::instrument(
        skip(self, source),
        fields(path = %source.path.display(), declared_name = %source.declared_name)
    )]
    pub async fn validate_local(
        &self,
        source: &LocalFile,
        category_name: &str,
        max_size_override: Option<u64>,
    ) -> IngestResult<ValidatedUpload> {
        let category = self.resolve_category(category_name)?;
        self.check_integrity(source).await?;
        Self::check_size(source.size, Self::ceiling(category, max_size_override))?;

        let bytes = tokio::fs::read(&source.path).await.map_err(|e| {
            IngestError::InvalidFile(format!("{}: {}", source.path.display(), e))
        })?;
        let detected = self.detect_mime_type(&bytes)?;
        let mime_type = self.check_mime_allowed(&detected, category)?;
        let extension = self.table.extension_or_fallback(&mime_type).to_string();

        tracing::debug!(
            mime_type = %mime_type,
            declared_mime_type = %source.declared_mime_type,
            size_bytes = bytes.len(),
            "Upload validated"
        );

        Ok(ValidatedUpload {
            bytes,
            mime_type,
            extension,
            category: category.clone(),
        })
    }

    /// Exists, is a regular file, matches its declared size, and has a name.
    async fn check_integrity(&self, source: &LocalFile) -> IngestResult<()> {
        if source.declared_name.trim().is_empty() {
            return Err(IngestError::InvalidFile("missing file name".to_string()));
        }

        let meta = tokio::fs::metadata(&source.path).await.map_err(|e| {
            IngestError::InvalidFile(format!("{}: {}", source.path.display(), e))
        })?;
        if !meta.is_file() {
            return Err(IngestError::InvalidFile(format!(
                "{} is not a regular file",
                source.path.display()
            )));
        }
        if meta.len() != source.size {
            return Err(IngestError::InvalidFile(format!(
                "declared size {} does not match actual size {}",
                source.size,
                meta.len()
            )));
        }
        Ok(())
    }

    /// Syntactic URL check: parseable, http or https, with a host. No I/O.
    pub fn validate_url_shape(&self, raw: &str) -> IngestResult<Url> {
        let url = Url::parse(raw.trim()).map_err(|_| IngestError::InvalidUrl(raw.to_string()))?;
        let has_host = !url.host_str().unwrap_or_default().is_empty();
        if !matches!(url.scheme(), "http" | "https") || !has_host {
            return Err(IngestError::InvalidUrl(raw.to_string()));
        }
        Ok(url)
    }

    /// HEAD the URL and reject it early on status, declared type or declared size.
    /// The downloaded content is still sniffed afterwards.
    pub async fn probe_url(
        &self,
        url: &str,
        category_name: &str,
        max_size_override: Option<u64>,
    ) -> IngestResult<()> {
        let category = self.resolve_category(category_name)?;
        let probe = self.fetcher.probe(url).await?;

        if let Some(content_type) = probe.content_type.as_deref() {
            self.check_mime_allowed(content_type, category)?;
        }
        if let Some(length) = probe.content_length {
            Self::check_size(length, Self::ceiling(category, max_size_override))?;
        }
        Ok(())
    }

    /// Shape check plus, when enabled, the header probe.
    pub async fn validate_url(
        &self,
        url: &str,
        category_name: &str,
        max_size_override: Option<u64>,
    ) -> IngestResult<()> {
        self.validate_url_shape(url)?;
        self.resolve_category(category_name)?;
        if self.config.validation.url.probe_headers {
            self.probe_url(url, category_name, max_size_override).await?;
        }
        Ok(())
    }
}
