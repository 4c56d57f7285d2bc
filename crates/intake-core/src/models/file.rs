//! File metadata record and its supporting types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::IngestError;

/// How the bytes reached the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "file_source_type", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Upload,
    Url,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Upload => "upload",
            SourceKind::Url => "url",
        }
    }
}

impl FromStr for SourceKind {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upload" => Ok(SourceKind::Upload),
            "url" => Ok(SourceKind::Url),
            _ => Err(IngestError::Persistence(format!("Invalid source type: {}", s))),
        }
    }
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Opaque polymorphic reference to the entity a file belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    pub owner_type: String,
    pub owner_id: String,
}

impl OwnerRef {
    pub fn new(owner_type: impl Into<String>, owner_id: impl ToString) -> Self {
        Self {
            owner_type: owner_type.into(),
            owner_id: owner_id.to_string(),
        }
    }
}

/// Everything needed to insert a metadata row; id and timestamps are assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFileRecord {
    pub original_name: String,
    pub stored_name: String,
    pub stored_path: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub extension: String,
    pub file_type: String,
    pub source_kind: SourceKind,
    pub source_url: Option<String>,
    pub disk: String,
    pub owner: Option<OwnerRef>,
}

/// Durable metadata for one stored artifact.
///
/// `(disk, stored_path)` addresses the physical bytes. `original_name` is whatever the
/// source claimed and must be treated as untrusted; `mime_type` and `extension` come from
/// content sniffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub original_name: String,
    pub stored_name: String,
    pub stored_path: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub extension: String,
    pub file_type: String,
    pub source_kind: SourceKind,
    pub source_url: Option<String>,
    pub disk: String,
    pub owner_type: Option<String>,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// Materializes a new record as a store would after inserting it.
    pub fn from_new(new: NewFileRecord, id: Uuid, now: DateTime<Utc>) -> Self {
        let (owner_type, owner_id) = match new.owner {
            Some(owner) => (Some(owner.owner_type), Some(owner.owner_id)),
            None => (None, None),
        };
        Self {
            id,
            original_name: new.original_name,
            stored_name: new.stored_name,
            stored_path: new.stored_path,
            size_bytes: new.size_bytes,
            mime_type: new.mime_type,
            extension: new.extension,
            file_type: new.file_type,
            source_kind: new.source_kind,
            source_url: new.source_url,
            disk: new.disk,
            owner_type,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_from_url(&self) -> bool {
        self.source_kind == SourceKind::Url
    }

    pub fn is_from_upload(&self) -> bool {
        self.source_kind == SourceKind::Upload
    }

    pub fn owner(&self) -> Option<OwnerRef> {
        match (&self.owner_type, &self.owner_id) {
            (Some(owner_type), Some(owner_id)) => Some(OwnerRef {
                owner_type: owner_type.clone(),
                owner_id: owner_id.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_record(owner: Option<OwnerRef>) -> NewFileRecord {
        NewFileRecord {
            original_name: "photo.png".to_string(),
            stored_name: "abc.png".to_string(),
            stored_path: "files/abc.png".to_string(),
            size_bytes: 10,
            mime_type: "image/png".to_string(),
            extension: "png".to_string(),
            file_type: "image".to_string(),
            source_kind: SourceKind::Upload,
            source_url: None,
            disk: "public".to_string(),
            owner,
        }
    }

    #[test]
    fn test_source_kind_parse_and_display() {
        assert_eq!("URL".parse::<SourceKind>().unwrap(), SourceKind::Url);
        assert_eq!(SourceKind::Upload.to_string(), "upload");
        assert!("ftp".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_from_new_splits_owner() {
        let owner = OwnerRef::new("user", 42);
        let record =
            FileRecord::from_new(new_record(Some(owner.clone())), Uuid::new_v4(), Utc::now());
        assert_eq!(record.owner_type.as_deref(), Some("user"));
        assert_eq!(record.owner_id.as_deref(), Some("42"));
        assert_eq!(record.owner(), Some(owner));
        assert!(record.is_from_upload());
        assert!(!record.is_from_url());
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn test_owner_requires_both_halves() {
        let mut record = FileRecord::from_new(new_record(None), Uuid::new_v4(), Utc::now());
        assert_eq!(record.owner(), None);
        record.owner_type = Some("user".to_string());
        assert_eq!(record.owner(), None);
    }
}
