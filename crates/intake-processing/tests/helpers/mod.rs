#![allow(dead_code)]

pub mod fixtures;

use async_trait::async_trait;
use intake_core::{
    DiskSettings, FileRecord, IngestError, IngestResult, LocalFile, NewFileRecord, OwnerRef,
    UploaderConfig,
};
use intake_db::{FileRepository, InMemoryFileRepository};
use intake_processing::Ingestor;
use intake_storage::Disks;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

/// Isolated ingestion environment over a scratch directory
pub struct TestEnv {
    pub ingestor: Ingestor,
    pub repository: InMemoryFileRepository,
    pub storage_root: PathBuf,
    pub staging_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestEnv {
    /// Write `bytes` to a scratch file and describe it as an upload named `name`
    pub fn local_file(&self, bytes: &[u8], name: &str) -> LocalFile {
        std::fs::create_dir_all(&self.uploads_dir).expect("Failed to create uploads dir");
        let path = self.uploads_dir.join(Uuid::new_v4().to_string());
        std::fs::write(&path, bytes).expect("Failed to write upload");
        LocalFile::new(path, name, "application/octet-stream", bytes.len() as u64)
    }

    pub fn stored_bytes(&self, record: &FileRecord) -> Vec<u8> {
        std::fs::read(self.storage_root.join(&record.stored_path)).expect("Missing stored file")
    }

    pub fn stored_file_count(&self) -> usize {
        count_files(&self.storage_root)
    }

    pub fn staged_file_count(&self) -> usize {
        count_files(&self.staging_dir)
    }
}

/// Setup an environment with default configuration
pub async fn setup_test_env() -> TestEnv {
    setup_test_env_with(|_| {}, |repo| Arc::new(repo) as Arc<dyn FileRepository>).await
}

/// Setup an environment, adjusting the config and wrapping the repository
pub async fn setup_test_env_with<C, R>(configure: C, wrap: R) -> TestEnv
where
    C: FnOnce(&mut UploaderConfig),
    R: FnOnce(InMemoryFileRepository) -> Arc<dyn FileRepository>,
{
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage_root = temp_dir.path().join("public");
    let staging_dir = temp_dir.path().join("staging");
    let uploads_dir = temp_dir.path().join("uploads");

    let mut config = UploaderConfig::default();
    config.storage.disks.clear();
    config.storage.disks.insert(
        "public".to_string(),
        DiskSettings {
            root: storage_root.clone(),
            base_url: Some("/storage".to_string()),
        },
    );
    config.validation.url.temp_dir = Some(staging_dir.clone());
    config.validation.url.timeout = 5;
    configure(&mut config);
    config.validate().expect("Invalid test config");

    let config = Arc::new(config);
    let disks = Disks::from_config(&config)
        .await
        .expect("Failed to create disks");
    let repository = InMemoryFileRepository::new();
    let ingestor = Ingestor::new(config, disks, wrap(repository.clone()))
        .expect("Failed to create ingestor");

    TestEnv {
        ingestor,
        repository,
        storage_root,
        staging_dir,
        uploads_dir,
        _temp_dir: temp_dir,
    }
}

/// Regular files under `dir`, recursively; 0 if it does not exist
pub fn count_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

/// Repository that delegates to an in-memory store but can be told to fail
#[derive(Clone, Default)]
pub struct FailingRepository {
    pub inner: InMemoryFileRepository,
    pub fail_create: bool,
    pub fail_mark_from_url: bool,
}

impl FailingRepository {
    fn failure(operation: &str) -> IngestError {
        IngestError::Persistence(format!("simulated {} failure", operation))
    }
}

#[async_trait]
impl FileRepository for FailingRepository {
    async fn create(&self, new: NewFileRecord) -> IngestResult<FileRecord> {
        if self.fail_create {
            return Err(Self::failure("create"));
        }
        self.inner.create(new).await
    }

    async fn mark_from_url(&self, id: Uuid, source_url: &str) -> IngestResult<FileRecord> {
        if self.fail_mark_from_url {
            return Err(Self::failure("mark_from_url"));
        }
        self.inner.mark_from_url(id, source_url).await
    }

    async fn set_owner(&self, id: Uuid, owner: &OwnerRef) -> IngestResult<FileRecord> {
        self.inner.set_owner(id, owner).await
    }

    async fn get(&self, id: Uuid) -> IngestResult<Option<FileRecord>> {
        self.inner.get(id).await
    }

    async fn list_by_owner(&self, owner: &OwnerRef) -> IngestResult<Vec<FileRecord>> {
        self.inner.list_by_owner(owner).await
    }

    async fn delete(&self, id: Uuid) -> IngestResult<bool> {
        self.inner.delete(id).await
    }
}
