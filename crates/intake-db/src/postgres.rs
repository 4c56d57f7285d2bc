//! Postgres file repository: CRUD for the files table.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use intake_core::{FileRecord, IngestError, IngestResult, NewFileRecord, OwnerRef, SourceKind};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use std::time::Duration;
use uuid::Uuid;

use crate::repository::FileRepository;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT_SECS: u64 = 30;

const FILE_COLUMNS: &str = "id, original_name, file_name, file_path, file_size, mime_type, \
     extension, file_type, source_type, source_url, disk, owner_type, owner_id, \
     created_at, updated_at";

/// Connect to Postgres with the pool settings used by the CLI
pub async fn connect(database_url: &str) -> Result<PgPool> {
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected successfully");
    Ok(pool)
}

/// Row type for files table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct FileRow {
    pub id: Uuid,
    pub original_name: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub extension: String,
    pub file_type: String,
    pub source_type: SourceKind,
    pub source_url: Option<String>,
    pub disk: String,
    pub owner_type: Option<String>,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRow {
    pub fn to_file_record(self) -> FileRecord {
        FileRecord {
            id: self.id,
            original_name: self.original_name,
            stored_name: self.file_name,
            stored_path: self.file_path,
            size_bytes: self.file_size,
            mime_type: self.mime_type,
            extension: self.extension,
            file_type: self.file_type,
            source_kind: self.source_type,
            source_url: self.source_url,
            disk: self.disk,
            owner_type: self.owner_type,
            owner_id: self.owner_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Repository for the files table.
#[derive(Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    fn not_found(id: Uuid) -> IngestError {
        IngestError::Persistence(format!("File record {} not found", id))
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    #[tracing::instrument(skip(self, new), fields(db.table = "files", file.path = %new.stored_path))]
    async fn create(&self, new: NewFileRecord) -> IngestResult<FileRecord> {
        let (owner_type, owner_id) = match new.owner {
            Some(owner) => (Some(owner.owner_type), Some(owner.owner_id)),
            None => (None, None),
        };

        let row: FileRow = sqlx::query_as::<Postgres, FileRow>(&format!(
            r#"
            INSERT INTO files (
                id, original_name, file_name, file_path, file_size, mime_type,
                extension, file_type, source_type, source_url, disk, owner_type, owner_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            FILE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new.original_name)
        .bind(&new.stored_name)
        .bind(&new.stored_path)
        .bind(new.size_bytes)
        .bind(&new.mime_type)
        .bind(&new.extension)
        .bind(&new.file_type)
        .bind(new.source_kind)
        .bind(&new.source_url)
        .bind(&new.disk)
        .bind(&owner_type)
        .bind(&owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.to_file_record())
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.record_id = %id))]
    async fn mark_from_url(&self, id: Uuid, source_url: &str) -> IngestResult<FileRecord> {
        let row: Option<FileRow> = sqlx::query_as::<Postgres, FileRow>(&format!(
            r#"
            UPDATE files
            SET source_type = $2, source_url = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            FILE_COLUMNS
        ))
        .bind(id)
        .bind(SourceKind::Url)
        .bind(source_url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FileRow::to_file_record)
            .ok_or_else(|| Self::not_found(id))
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.record_id = %id))]
    async fn set_owner(&self, id: Uuid, owner: &OwnerRef) -> IngestResult<FileRecord> {
        let row: Option<FileRow> = sqlx::query_as::<Postgres, FileRow>(&format!(
            r#"
            UPDATE files
            SET owner_type = $2, owner_id = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            FILE_COLUMNS
        ))
        .bind(id)
        .bind(&owner.owner_type)
        .bind(&owner.owner_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FileRow::to_file_record)
            .ok_or_else(|| Self::not_found(id))
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> IngestResult<Option<FileRecord>> {
        let row: Option<FileRow> = sqlx::query_as::<Postgres, FileRow>(&format!(
            "SELECT {} FROM files WHERE id = $1",
            FILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(FileRow::to_file_record))
    }

    #[tracing::instrument(skip(self), fields(db.table = "files"))]
    async fn list_by_owner(&self, owner: &OwnerRef) -> IngestResult<Vec<FileRecord>> {
        let rows: Vec<FileRow> = sqlx::query_as::<Postgres, FileRow>(&format!(
            r#"
            SELECT {}
            FROM files
            WHERE owner_id = $1 AND owner_type = $2
            ORDER BY created_at DESC, id DESC
            "#,
            FILE_COLUMNS
        ))
        .bind(&owner.owner_id)
        .bind(&owner.owner_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FileRow::to_file_record).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> IngestResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
