//! File metadata repository trait
//!
//! The ingestion pipeline only talks to this trait, so it can run against Postgres or
//! the in-memory store.

use async_trait::async_trait;
use intake_core::{FileRecord, IngestResult, NewFileRecord, OwnerRef};
use uuid::Uuid;

#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert a record for bytes that are already durably stored
    async fn create(&self, new: NewFileRecord) -> IngestResult<FileRecord>;

    /// Flip a record to `source_type = url` and remember where it came from
    async fn mark_from_url(&self, id: Uuid, source_url: &str) -> IngestResult<FileRecord>;

    async fn set_owner(&self, id: Uuid, owner: &OwnerRef) -> IngestResult<FileRecord>;

    async fn get(&self, id: Uuid) -> IngestResult<Option<FileRecord>>;

    /// Records attached to `owner`, newest first
    async fn list_by_owner(&self, owner: &OwnerRef) -> IngestResult<Vec<FileRecord>>;

    /// Returns `false` when no record had this id
    async fn delete(&self, id: Uuid) -> IngestResult<bool>;
}
