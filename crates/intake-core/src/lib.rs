//! Intake Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and the
//! extension/MIME table shared by every Intake component.

pub mod config;
pub mod error;
pub mod mime_table;
pub mod models;

// Re-export commonly used types
pub use config::{
    DatabaseSettings, DefaultSettings, DiskSettings, NamingSettings, NamingStrategy,
    StorageSettings, UploaderConfig, UrlValidationSettings, ValidationSettings,
    CONFIG_PATH_ENV, DEFAULT_USER_AGENT,
};
pub use error::{ErrorMetadata, IngestError, IngestResult, LogLevel};
pub use mime_table::MimeTable;
pub use models::{
    FileRecord, FileTypeCategory, LocalFile, NewFileRecord, OwnerRef, SourceKind, UploadSource,
};
