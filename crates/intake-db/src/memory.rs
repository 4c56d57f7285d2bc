//! In-memory file repository for tests and database-less runs.

use async_trait::async_trait;
use chrono::Utc;
use intake_core::{FileRecord, IngestError, IngestResult, NewFileRecord, OwnerRef, SourceKind};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repository::FileRepository;

/// Records kept in insertion order behind a shared lock; clones share state.
#[derive(Clone, Default)]
pub struct InMemoryFileRepository {
    records: Arc<RwLock<Vec<FileRecord>>>,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> IngestResult<FileRecord>
    where
        F: FnOnce(&mut FileRecord) + Send,
    {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| IngestError::Persistence(format!("File record {} not found", id)))?;
        apply(record);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn create(&self, new: NewFileRecord) -> IngestResult<FileRecord> {
        let record = FileRecord::from_new(new, Uuid::new_v4(), Utc::now());
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn mark_from_url(&self, id: Uuid, source_url: &str) -> IngestResult<FileRecord> {
        let source_url = source_url.to_string();
        self.update(id, move |record| {
            record.source_kind = SourceKind::Url;
            record.source_url = Some(source_url);
        })
        .await
    }

    async fn set_owner(&self, id: Uuid, owner: &OwnerRef) -> IngestResult<FileRecord> {
        let owner = owner.clone();
        self.update(id, move |record| {
            record.owner_type = Some(owner.owner_type);
            record.owner_id = Some(owner.owner_id);
        })
        .await
    }

    async fn get(&self, id: Uuid) -> IngestResult<Option<FileRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list_by_owner(&self, owner: &OwnerRef) -> IngestResult<Vec<FileRecord>> {
        // Later inserts win ties on created_at.
        let mut owned: Vec<FileRecord> = self
            .records
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.owner().as_ref() == Some(owner))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn delete(&self, id: Uuid) -> IngestResult<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_record(name: &str, owner: Option<OwnerRef>) -> NewFileRecord {
        NewFileRecord {
            original_name: name.to_string(),
            stored_name: format!("stored-{}", name),
            stored_path: format!("files/stored-{}", name),
            size_bytes: 1,
            mime_type: "text/plain".to_string(),
            extension: "txt".to_string(),
            file_type: "document".to_string(),
            source_kind: SourceKind::Upload,
            source_url: None,
            disk: "public".to_string(),
            owner,
        }
    }

    #[tokio::test]
    async fn test_create_get_delete() {
        let repo = InMemoryFileRepository::new();
        let record = repo.create(new_record("a.txt", None)).await.unwrap();

        assert_eq!(repo.get(record.id).await.unwrap(), Some(record.clone()));
        assert!(repo.delete(record.id).await.unwrap());
        assert!(!repo.delete(record.id).await.unwrap());
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_mark_from_url() {
        let repo = InMemoryFileRepository::new();
        let record = repo.create(new_record("a.txt", None)).await.unwrap();

        let updated = repo
            .mark_from_url(record.id, "https://example.com/a.txt")
            .await
            .unwrap();
        assert!(updated.is_from_url());
        assert_eq!(
            updated.source_url.as_deref(),
            Some("https://example.com/a.txt")
        );
        assert!(updated.updated_at >= record.updated_at);

        let missing = repo.mark_from_url(Uuid::new_v4(), "https://x").await;
        assert!(matches!(missing, Err(IngestError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_list_by_owner_newest_first() {
        let repo = InMemoryFileRepository::new();
        let owner = OwnerRef::new("user", 7);
        let other = OwnerRef::new("user", 8);

        let first = repo
            .create(new_record("1.txt", Some(owner.clone())))
            .await
            .unwrap();
        repo.create(new_record("x.txt", Some(other))).await.unwrap();
        let unowned = repo.create(new_record("2.txt", None)).await.unwrap();
        repo.set_owner(unowned.id, &owner).await.unwrap();

        let listed = repo.list_by_owner(&owner).await.unwrap();
        let names: Vec<_> = listed.iter().map(|r| r.original_name.as_str()).collect();
        assert_eq!(names, vec!["2.txt", "1.txt"]);
        assert_eq!(listed[1].id, first.id);
    }
}
