//! Storage abstraction trait
//!
//! This module defines the Storage trait that every disk implements.

use async_trait::async_trait;
use intake_core::IngestError;
use std::path::PathBuf;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Unknown disk: {0}")]
    UnknownDisk(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for IngestError {
    fn from(err: StorageError) -> Self {
        IngestError::Storage(err.to_string())
    }
}

/// A named backing store addressed by relative keys (`files/avatars/abc.png`).
///
/// Keys use `/` as separator, are relative to the disk root, and must not contain
/// `..` segments.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Disk name as configured (`public`, `local`, ...)
    fn name(&self) -> &str;

    /// Write `data` under `key`, creating parent directories. Overwrites.
    async fn put(&self, key: &str, data: &[u8]) -> StorageResult<()>;

    /// Read the full contents stored under `key`
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Remove `key`. Returns `false` when there was nothing to remove.
    async fn delete(&self, key: &str) -> StorageResult<bool>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Public URL for `key`, when the disk is web-addressable
    fn url(&self, key: &str) -> Option<String>;

    /// Filesystem location for `key`, when the disk is filesystem-backed
    fn absolute_path(&self, key: &str) -> Option<PathBuf>;
}
