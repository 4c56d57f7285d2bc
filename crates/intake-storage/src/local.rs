use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem disk
#[derive(Clone, Debug)]
pub struct LocalStorage {
    name: String,
    base_path: PathBuf,
    base_url: Option<String>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, creating the root directory if needed
    ///
    /// # Arguments
    /// * `name` - Disk name records refer to (e.g., "public")
    /// * `base_path` - Root directory for file storage (e.g., "storage/app/public")
    /// * `base_url` - Public URL prefix (e.g., "/storage"), if the disk is served
    pub async fn new(
        name: impl Into<String>,
        base_path: impl Into<PathBuf>,
        base_url: Option<String>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            name: name.into(),
            base_path,
            base_url,
        })
    }

    /// Convert a storage key to a filesystem path with traversal validation
    ///
    /// Only plain relative segments are accepted, so the result always stays under the
    /// disk root.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty() || storage_key.contains('\\') || storage_key.contains('\0') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let relative = Path::new(storage_key);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(self.base_path.join(relative))
    }

    fn generate_url(&self, key: &str) -> Option<String> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), key))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.key_to_path(key)?;

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            disk = %self.name,
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        fs::read(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(disk = %self.name, key = %key, "Nothing to delete");
            return Ok(false);
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            disk = %self.name,
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(true)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn url(&self, key: &str) -> Option<String> {
        self.key_to_path(key).ok()?;
        self.generate_url(key)
    }

    fn absolute_path(&self, key: &str) -> Option<PathBuf> {
        self.key_to_path(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new("public", dir, Some("/storage".to_string()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_local_storage_put_get() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let data = b"test data".to_vec();
        storage.put("files/nested/test.txt", &data).await.unwrap();

        assert_eq!(storage.get("files/nested/test.txt").await.unwrap(), data);
        assert!(dir.path().join("files/nested/test.txt").is_file());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.get("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("files/../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.put("files\\..\\x", b"x").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_reports_absence() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        assert!(!storage.delete("nonexistent/file.txt").await.unwrap());

        storage.put("files/a.txt", b"a").await.unwrap();
        assert!(storage.delete("files/a.txt").await.unwrap());
        assert!(!storage.exists("files/a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.get("files/missing.png").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_url_and_absolute_path() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        assert_eq!(
            storage.url("files/a.png").as_deref(),
            Some("/storage/files/a.png")
        );
        assert_eq!(
            storage.absolute_path("files/a.png"),
            Some(dir.path().join("files/a.png"))
        );
        assert_eq!(storage.url("../a.png"), None);

        let private = LocalStorage::new("local", dir.path(), None).await.unwrap();
        assert_eq!(private.url("files/a.png"), None);
    }
}
