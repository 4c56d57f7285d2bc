//! Ingestion pipeline
//!
//! `Start → Validated → Staged → Stored → RecordPersisted`. Validation failures stop
//! before any write. Once bytes are on a disk, a failure to persist their record
//! removes them again.

use intake_core::{
    FileRecord, FileTypeCategory, IngestError, IngestResult, LocalFile, NewFileRecord, OwnerRef,
    SourceKind, UploadSource, UploaderConfig,
};
use intake_db::FileRepository;
use intake_storage::{destination_directory, join_key, Disks, Storage};
use std::path::Path;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use crate::fetch::HttpFetcher;
use crate::naming::FileNamer;
use crate::staging::StagedFile;
use crate::validator::{ValidatedUpload, Validator};

const DOWNLOADED_FILE_STEM: &str = "downloaded_file";
const MAX_NAME_ATTEMPTS: usize = 5;

/// Optional per-call parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOptions {
    /// Category name; the configured default when unset
    pub file_type: Option<String>,
    /// Ceiling override in bytes
    pub max_size: Option<u64>,
    /// Sub-folder under the storage base path; sanitized before use
    pub folder: Option<String>,
    pub owner: Option<OwnerRef>,
}

impl IngestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    pub fn max_size(mut self, max_size_bytes: u64) -> Self {
        self.max_size = Some(max_size_bytes);
        self
    }

    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn owner(mut self, owner: OwnerRef) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// What `delete` actually removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// `false` when the bytes were already gone
    pub artifact_removed: bool,
    /// `false` when the record was already gone
    pub record_removed: bool,
}

#[derive(Clone)]
pub struct Ingestor {
    config: Arc<UploaderConfig>,
    validator: Validator,
    fetcher: HttpFetcher,
    namer: FileNamer,
    disks: Disks,
    repository: Arc<dyn FileRepository>,
}

impl Ingestor {
    pub fn new(
        config: Arc<UploaderConfig>,
        disks: Disks,
        repository: Arc<dyn FileRepository>,
    ) -> IngestResult<Self> {
        let fetcher = HttpFetcher::new(&config.validation.url)?;
        let validator = Validator::new(config.clone(), fetcher.clone());
        let namer = FileNamer::new(config.naming.strategy, config.naming.length);
        Ok(Self {
            config,
            validator,
            fetcher,
            namer,
            disks,
            repository,
        })
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn disks(&self) -> &Disks {
        &self.disks
    }

    pub fn repository(&self) -> &Arc<dyn FileRepository> {
        &self.repository
    }

    /// Public URL of a record, when its disk is web-addressable
    pub fn url(&self, record: &FileRecord) -> Option<String> {
        self.disks.url_for(record)
    }

    pub async fn find(&self, id: Uuid) -> IngestResult<Option<FileRecord>> {
        self.repository.get(id).await
    }

    pub fn category_config(&self, name: &str) -> IngestResult<FileTypeCategory> {
        self.validator.category_config(name)
    }

    fn category_name<'a>(&'a self, options: &'a IngestOptions) -> &'a str {
        options
            .file_type
            .as_deref()
            .unwrap_or(&self.config.defaults.file_type)
    }

    /// Validates a local file without storing it.
    pub async fn validate_file(
        &self,
        source: &LocalFile,
        options: &IngestOptions,
    ) -> IngestResult<ValidatedUpload> {
        self.validator
            .validate_local(source, self.category_name(options), options.max_size)
            .await
    }

    /// Validates a URL without downloading it.
    pub async fn validate_url(&self, url: &str, options: &IngestOptions) -> IngestResult<()> {
        self.validator
            .validate_url(url, self.category_name(options), options.max_size)
            .await
    }

    pub async fn upload(
        &self,
        source: &LocalFile,
        options: &IngestOptions,
    ) -> IngestResult<FileRecord> {
        self.ingest_local(source, options).await
    }

    pub async fn upload_from_url(
        &self,
        url: &str,
        options: &IngestOptions,
    ) -> IngestResult<FileRecord> {
        self.ingest_from_url(url, options).await
    }

    /// Validate, store and record a local file.
    #[tracing::instrument(
        skip(self, source, options),
        fields(
            declared_name = %source.declared_name,
            file_type = %self.category_name(options),
            operation = "ingest_local"
        )
    )]
    pub async fn ingest_local(
        &self,
        source: &LocalFile,
        options: &IngestOptions,
    ) -> IngestResult<FileRecord> {
        let validated = self.validate_file(source, options).await?;

        let disk = self.disks.default_disk()?;
        let directory =
            destination_directory(&self.config.storage.path, options.folder.as_deref());
        let stored_name = self
            .available_name(
                disk.as_ref(),
                &directory,
                &source.declared_name,
                &validated.extension,
            )
            .await?;
        let key = join_key(&directory, &stored_name);

        disk.put(&key, &validated.bytes).await?;

        let new = NewFileRecord {
            original_name: source.declared_name.clone(),
            stored_name,
            stored_path: key.clone(),
            size_bytes: validated.bytes.len() as i64,
            mime_type: validated.mime_type,
            extension: validated.extension,
            file_type: validated.category.name,
            source_kind: SourceKind::Upload,
            source_url: None,
            disk: disk.name().to_string(),
            owner: options.owner.clone(),
        };

        match self.repository.create(new).await {
            Ok(record) => {
                tracing::info!(
                    file_id = %record.id,
                    disk = %record.disk,
                    path = %record.stored_path,
                    mime_type = %record.mime_type,
                    size_bytes = record.size_bytes,
                    "File ingested"
                );
                Ok(record)
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    key = %key,
                    "Failed to save file metadata, removing stored artifact"
                );
                discard_artifact(disk.as_ref(), &key).await;
                Err(err)
            }
        }
    }

    /// Download, validate, store and record a remote file.
    #[tracing::instrument(
        skip(self, options),
        fields(file_type = %self.category_name(options), operation = "ingest_from_url")
    )]
    pub async fn ingest_from_url(
        &self,
        url: &str,
        options: &IngestOptions,
    ) -> IngestResult<FileRecord> {
        let parsed = self.validator.validate_url_shape(url)?;
        let category_name = self.category_name(options);
        let category = self.validator.resolve_category(category_name)?;
        let ceiling = Validator::ceiling(category, options.max_size);

        if self.config.validation.url.probe_headers {
            self.validator
                .probe_url(url, category_name, options.max_size)
                .await?;
        }

        let body = self.fetcher.fetch(parsed.as_str(), ceiling).await?;
        let detected = self.validator.detect_mime_type(&body.bytes)?;
        let mime_type = self.validator.check_mime_allowed(&detected, category)?;
        let extension = self.validator.mime_table().extension_or_fallback(&mime_type);
        let filename = remote_filename(&parsed, extension);

        let staged = StagedFile::create(
            self.config.validation.url.temp_dir.as_deref(),
            body.bytes,
        )
        .await?;
        let local = LocalFile::new(staged.path(), filename, mime_type, staged.size());

        let result = self.store_downloaded(&local, url, options).await;
        staged.discard();
        result
    }

    async fn store_downloaded(
        &self,
        local: &LocalFile,
        url: &str,
        options: &IngestOptions,
    ) -> IngestResult<FileRecord> {
        let record = self.ingest_local(local, options).await?;
        match self.repository.mark_from_url(record.id, url).await {
            Ok(record) => Ok(record),
            Err(err) => {
                tracing::error!(
                    error = %err,
                    file_id = %record.id,
                    "Failed to record URL source, rolling back ingestion"
                );
                if let Err(cleanup_err) = self.delete(&record).await {
                    tracing::error!(
                        error = %cleanup_err,
                        file_id = %record.id,
                        "Rollback after URL source failure did not complete"
                    );
                }
                Err(err)
            }
        }
    }

    /// Dispatch on the source kind.
    pub async fn handle(
        &self,
        source: &UploadSource,
        options: &IngestOptions,
    ) -> IngestResult<FileRecord> {
        match source {
            UploadSource::LocalFile(local) => self.ingest_local(local, options).await,
            UploadSource::RemoteUrl { url } => self.ingest_from_url(url, options).await,
        }
    }

    /// Classify an untyped string as a URL or local path, then dispatch.
    pub async fn handle_str(
        &self,
        raw: &str,
        options: &IngestOptions,
    ) -> IngestResult<FileRecord> {
        let source = UploadSource::classify(raw)?;
        self.handle(&source, options).await
    }

    /// Delete a record's bytes, then the record. The record is kept when the bytes could
    /// not be removed.
    #[tracing::instrument(skip(self, record), fields(file_id = %record.id, disk = %record.disk))]
    pub async fn delete(&self, record: &FileRecord) -> IngestResult<DeleteOutcome> {
        let disk = self.disks.get(&record.disk)?;
        let artifact_removed = disk.delete(&record.stored_path).await?;
        if !artifact_removed {
            tracing::warn!(path = %record.stored_path, "Stored artifact was already missing");
        }
        let record_removed = self.repository.delete(record.id).await?;

        Ok(DeleteOutcome {
            artifact_removed,
            record_removed,
        })
    }

    /// `delete` with the error logged and reduced to `false`.
    pub async fn delete_quietly(&self, record: &FileRecord) -> bool {
        match self.delete(record).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(error = %e, file_id = %record.id, "Failed to delete file");
                false
            }
        }
    }

    /// A stored name that is not yet taken in `directory`.
    async fn available_name(
        &self,
        disk: &dyn Storage,
        directory: &str,
        original_name: &str,
        extension: &str,
    ) -> IngestResult<String> {
        let mut name = self.namer.generate(original_name, extension);
        for _ in 0..MAX_NAME_ATTEMPTS {
            if !disk.exists(&join_key(directory, &name)).await? {
                return Ok(name);
            }
            tracing::debug!(name = %name, "Stored name taken, picking another");
            name = self.namer.disambiguate(&self.namer.generate(original_name, extension));
        }
        Err(IngestError::Storage(format!(
            "Could not find a free name in {} after {} attempts",
            directory, MAX_NAME_ATTEMPTS
        )))
    }
}

async fn discard_artifact(disk: &dyn Storage, key: &str) {
    if let Err(cleanup_err) = disk.delete(key).await {
        tracing::error!(
            error = %cleanup_err,
            key = %key,
            "Failed to cleanup stored artifact after metadata error"
        );
    }
}

/// Name a download after the last URL path segment. A segment without an extension
/// (or no segment at all) gets the extension of the detected type.
pub fn remote_filename(url: &Url, extension: &str) -> String {
    let basename = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .filter(|s| *s != "." && *s != "..")
        .unwrap_or_default();

    if !basename.is_empty() && Path::new(basename).extension().is_some() {
        return basename.to_string();
    }

    let stem = if basename.is_empty() {
        DOWNLOADED_FILE_STEM
    } else {
        basename
    };
    format!("{}.{}", stem, extension)
}
