//! Intake Storage Library
//!
//! This crate provides the storage abstraction, the local filesystem disk and the
//! named-disk registry used by the ingestion pipeline.
//!
//! # Storage key format
//!
//! Keys are relative to a disk root: `{storage.path}/{folder}/{stored name}`. Folder
//! segments are sanitized by the `keys` module, and disks reject any key with `..`,
//! absolute or backslash components.

pub mod factory;
pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::Disks;
pub use keys::{destination_directory, join_key, sanitize_folder};
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
