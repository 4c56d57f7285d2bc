//! Error types module
//!
//! Every failure the ingestion pipeline can surface is a variant of [`IngestError`].
//! None of them are process-fatal: callers decide whether to retry, report or drop.
//!
//! `From<sqlx::Error>` is gated behind the `sqlx` feature.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like unreachable remote sources
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "SIZE_EXCEEDED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("The uploaded file is invalid: {0}")]
    InvalidFile(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to download file from URL: {url} ({reason})")]
    DownloadFailed { url: String, reason: String },

    #[error("File size exceeds maximum limit of {max_kib} KB")]
    SizeExceeded { max_kib: u64 },

    #[error("Unsupported MIME type: {0}")]
    InvalidMimeType(String),

    #[error("Unknown file type category: {0}")]
    UnknownCategory(String),

    #[error("File content is empty")]
    EmptyContent,

    #[error("Source is neither a valid URL nor a readable local file: {0}")]
    InvalidSource(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type IngestResult<T> = Result<T, IngestError>;

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for IngestError {
    fn from(err: sqlx::Error) -> Self {
        IngestError::Persistence(err.to_string())
    }
}

impl IngestError {
    /// Builds a `SizeExceeded` from a byte ceiling; the error reports kibibytes, rounded up.
    pub fn size_exceeded(ceiling_bytes: u64) -> Self {
        IngestError::SizeExceeded {
            max_kib: ceiling_bytes.div_ceil(1024),
        }
    }

    pub fn download_failed(url: impl Into<String>, reason: impl ToString) -> Self {
        IngestError::DownloadFailed {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
fn ingest_error_static_metadata(err: &IngestError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        IngestError::InvalidFile(_) => (400, "INVALID_FILE", false, LogLevel::Debug),
        IngestError::InvalidUrl(_) => (400, "INVALID_URL", false, LogLevel::Debug),
        IngestError::DownloadFailed { .. } => (502, "DOWNLOAD_FAILED", true, LogLevel::Warn),
        IngestError::SizeExceeded { .. } => (413, "SIZE_EXCEEDED", false, LogLevel::Debug),
        IngestError::InvalidMimeType(_) => (415, "INVALID_MIME_TYPE", false, LogLevel::Debug),
        IngestError::UnknownCategory(_) => (400, "UNKNOWN_CATEGORY", false, LogLevel::Debug),
        IngestError::EmptyContent => (400, "EMPTY_CONTENT", false, LogLevel::Debug),
        IngestError::InvalidSource(_) => (400, "INVALID_SOURCE", false, LogLevel::Debug),
        IngestError::Storage(_) => (500, "STORAGE_ERROR", true, LogLevel::Error),
        IngestError::Persistence(_) => (500, "DATABASE_ERROR", true, LogLevel::Error),
        IngestError::Configuration(_) => (500, "CONFIGURATION_ERROR", false, LogLevel::Error),
        IngestError::Io(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for IngestError {
    fn http_status_code(&self) -> u16 {
        ingest_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        ingest_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        ingest_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        ingest_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            IngestError::Storage(_) => "Failed to access storage".to_string(),
            IngestError::Persistence(_) => "Failed to save file metadata".to_string(),
            IngestError::Configuration(_) | IngestError::Io(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}
