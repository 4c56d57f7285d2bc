use crate::{LocalStorage, Storage, StorageError, StorageResult};
use intake_core::{FileRecord, UploaderConfig};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Registry of named disks. Records store a disk name; this resolves it.
#[derive(Clone, Default)]
pub struct Disks {
    disks: BTreeMap<String, Arc<dyn Storage>>,
    default_disk: String,
}

impl Disks {
    pub fn new(default_disk: impl Into<String>) -> Self {
        Self {
            disks: BTreeMap::new(),
            default_disk: default_disk.into(),
        }
    }

    /// Create every disk listed under `storage.disks`
    pub async fn from_config(config: &UploaderConfig) -> StorageResult<Self> {
        let mut disks = Self::new(config.storage.disk.clone());
        for (name, settings) in &config.storage.disks {
            let storage =
                LocalStorage::new(name.clone(), settings.root.clone(), settings.base_url.clone())
                    .await?;
            disks.insert(Arc::new(storage));
        }

        if !disks.disks.contains_key(&disks.default_disk) {
            return Err(StorageError::ConfigError(format!(
                "Default disk '{}' is not configured",
                disks.default_disk
            )));
        }

        tracing::debug!(
            disks = ?disks.names().collect::<Vec<_>>(),
            default_disk = %disks.default_disk,
            "Storage disks initialized"
        );
        Ok(disks)
    }

    /// Registers `storage` under its own name, replacing any disk with that name
    pub fn insert(&mut self, storage: Arc<dyn Storage>) {
        self.disks.insert(storage.name().to_string(), storage);
    }

    pub fn get(&self, name: &str) -> StorageResult<Arc<dyn Storage>> {
        self.disks
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::UnknownDisk(name.to_string()))
    }

    /// The disk new artifacts are written to
    pub fn default_disk(&self) -> StorageResult<Arc<dyn Storage>> {
        self.get(&self.default_disk)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.disks.keys().map(String::as_str)
    }

    /// Public URL of a record's bytes, if its disk is web-addressable
    pub fn url_for(&self, record: &FileRecord) -> Option<String> {
        self.disks.get(&record.disk)?.url(&record.stored_path)
    }

    /// Filesystem location of a record's bytes, if its disk is filesystem-backed
    pub fn absolute_path_for(&self, record: &FileRecord) -> Option<PathBuf> {
        self.disks.get(&record.disk)?.absolute_path(&record.stored_path)
    }
}
