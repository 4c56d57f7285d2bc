//! Owner-scoped convenience over an [`Ingestor`].

use intake_core::{FileRecord, IngestResult, OwnerRef, UploadSource};

use crate::ingest::{IngestOptions, Ingestor};

/// Files attached to one owner. The owner is an opaque `(type, id)` pair.
pub struct FileAttachments<'a> {
    ingestor: &'a Ingestor,
    owner: OwnerRef,
}

impl<'a> FileAttachments<'a> {
    pub fn new(ingestor: &'a Ingestor, owner: OwnerRef) -> Self {
        Self { ingestor, owner }
    }

    pub fn owner(&self) -> &OwnerRef {
        &self.owner
    }

    /// Ingest `source` and attach the result to this owner.
    pub async fn attach(
        &self,
        source: &UploadSource,
        options: IngestOptions,
    ) -> IngestResult<FileRecord> {
        let options = options.owner(self.owner.clone());
        self.ingestor.handle(source, &options).await
    }

    /// Attach an already stored file to this owner, replacing any previous owner.
    pub async fn adopt(&self, record: &FileRecord) -> IngestResult<FileRecord> {
        let adopted = self
            .ingestor
            .repository()
            .set_owner(record.id, &self.owner)
            .await?;
        tracing::debug!(
            file_id = %record.id,
            owner_type = %self.owner.owner_type,
            owner_id = %self.owner.owner_id,
            "Attached existing file"
        );
        Ok(adopted)
    }

    /// Attached files, newest first
    pub async fn files(&self) -> IngestResult<Vec<FileRecord>> {
        self.ingestor.repository().list_by_owner(&self.owner).await
    }

    pub async fn latest(&self) -> IngestResult<Option<FileRecord>> {
        Ok(self.files().await?.into_iter().next())
    }

    pub async fn latest_url(&self) -> IngestResult<Option<String>> {
        Ok(self
            .latest()
            .await?
            .and_then(|record| self.ingestor.url(&record)))
    }

    /// Delete every attached file. `true` only if every deletion succeeded.
    pub async fn delete_all(&self) -> IngestResult<bool> {
        let mut all_deleted = true;
        for record in self.files().await? {
            all_deleted &= self.ingestor.delete_quietly(&record).await;
        }
        tracing::info!(
            owner_type = %self.owner.owner_type,
            owner_id = %self.owner.owner_id,
            all_deleted,
            "Deleted attached files"
        );
        Ok(all_deleted)
    }
}
