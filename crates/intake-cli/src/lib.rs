//! Command-line front end for the intake pipeline.
//!
//! Configuration comes from `--config` or `INTAKE_CONFIG`, then `INTAKE_*` overrides.
//! Records are written to Postgres when `database.url` (or `DATABASE_URL`) is set.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use intake_core::{FileTypeCategory, IngestResult, OwnerRef, UploaderConfig};
use intake_db::{FileRepository, InMemoryFileRepository, PgFileRepository};
use intake_processing::{HttpFetcher, IngestOptions, Ingestor, Validator};
use intake_storage::Disks;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "intake", about = "Validate and ingest files from local paths or URLs")]
pub struct Cli {
    /// TOML config file; takes precedence over INTAKE_CONFIG
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate, store and record a local file or URL
    Upload(IngestArgs),
    /// Run validation only; nothing is stored
    Validate(IngestArgs),
    /// Show one category, or list all of them
    Category {
        /// Category name
        name: Option<String>,
    },
    /// Delete a stored file and its record (requires a database)
    Delete {
        /// File record UUID
        id: Uuid,
    },
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Local path or http(s) URL
    pub source: String,

    /// File type category; defaults.file_type when omitted
    #[arg(long = "type", value_name = "CATEGORY")]
    pub file_type: Option<String>,

    /// Size ceiling override in bytes
    #[arg(long, value_name = "BYTES")]
    pub max_size: Option<u64>,

    /// Sub-folder under the storage base path
    #[arg(long)]
    pub folder: Option<String>,

    #[arg(long, requires = "owner_id")]
    pub owner_type: Option<String>,

    #[arg(long, requires = "owner_type")]
    pub owner_id: Option<String>,
}

impl IngestArgs {
    pub fn options(&self) -> IngestOptions {
        let mut options = IngestOptions::new();
        options.file_type = self.file_type.clone();
        options.max_size = self.max_size;
        options.folder = self.folder.clone();
        options.owner = self
            .owner_type
            .clone()
            .zip(self.owner_id.clone())
            .map(|(owner_type, owner_id)| OwnerRef::new(owner_type, owner_id));
        options
    }

    /// `--type`, else `defaults.file_type`.
    pub fn category<'a>(&'a self, config: &'a UploaderConfig) -> &'a str {
        self.file_type
            .as_deref()
            .unwrap_or(config.defaults.file_type.as_str())
    }
}

/// Initialize tracing for the CLI binary.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Wire disks and a repository around `config`.
pub async fn build_ingestor(config: UploaderConfig) -> Result<Ingestor> {
    let config = Arc::new(config);
    let disks = Disks::from_config(&config)
        .await
        .context("Failed to initialise storage disks")?;

    let repository: Arc<dyn FileRepository> = match config.database.url.as_deref() {
        Some(url) => {
            let pool = intake_db::connect(url).await?;
            let repository = PgFileRepository::new(pool);
            repository.migrate().await?;
            Arc::new(repository)
        }
        None => {
            tracing::warn!("No database configured; records only live for this process");
            Arc::new(InMemoryFileRepository::new())
        }
    };

    Ingestor::new(config, disks, repository).context("Failed to create ingestor")
}

/// A validator alone; no disk or database is touched.
pub fn build_validator(config: UploaderConfig) -> IngestResult<Validator> {
    let config = Arc::new(config);
    let fetcher = HttpFetcher::new(&config.validation.url)?;
    Ok(Validator::new(config, fetcher))
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// One line of the `category` listing.
pub fn category_row(category: &FileTypeCategory) -> String {
    format!(
        "{:<12} {:>8} KiB  {}",
        category.name,
        category.max_size,
        truncate_string(&category.mimes.join(", "), 60)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello", 5), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("hello", 0), "...");
    }

    #[test]
    fn truncate_string_counts_characters() {
        assert_eq!(truncate_string("ééééé", 5), "ééééé");
        assert_eq!(truncate_string("éééééé", 5), "éé...");
    }

    #[test]
    fn category_row_lists_extensions() {
        let row = category_row(&FileTypeCategory::new("pdf", &["pdf"], 10240));
        assert!(row.starts_with("pdf"));
        assert!(row.contains("10240 KiB"));
        assert!(row.ends_with("pdf"));
    }

    #[test]
    fn upload_args_become_options() {
        let cli = Cli::try_parse_from([
            "intake",
            "upload",
            "photo.png",
            "--type",
            "image",
            "--max-size",
            "2048",
            "--folder",
            "avatars",
            "--owner-type",
            "user",
            "--owner-id",
            "42",
        ])
        .unwrap();

        let Commands::Upload(args) = cli.command else {
            panic!("expected upload");
        };
        let options = args.options();
        assert_eq!(args.source, "photo.png");
        assert_eq!(options.file_type.as_deref(), Some("image"));
        assert_eq!(options.max_size, Some(2048));
        assert_eq!(options.folder.as_deref(), Some("avatars"));
        assert_eq!(options.owner, Some(OwnerRef::new("user", 42)));
    }

    #[test]
    fn owner_flags_must_come_together() {
        let result =
            Cli::try_parse_from(["intake", "upload", "a.png", "--owner-type", "user"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["intake", "category", "--config", "intake.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("intake.toml")));
        assert!(matches!(cli.command, Commands::Category { name: None }));
    }

    #[test]
    fn validate_falls_back_to_default_category() {
        let config = UploaderConfig::default();
        let cli = Cli::try_parse_from(["intake", "validate", "a.png"]).unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.category(&config), config.defaults.file_type);

        let cli = Cli::try_parse_from(["intake", "validate", "a.png", "--type", "pdf"]).unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.category(&config), "pdf");
    }

    #[tokio::test]
    async fn validator_does_not_create_storage_roots() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("public");
        let mut config = UploaderConfig::default();
        for disk in config.storage.disks.values_mut() {
            disk.root = root.clone();
        }

        let validator = build_validator(config).unwrap();
        let source = dir.path().join("photo.png");
        std::fs::write(&source, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D])
            .unwrap();
        let local = intake_core::LocalFile::new(&source, "photo.png", "image/png", 12);

        let validated = validator.validate_local(&local, "image", None).await.unwrap();
        assert_eq!(validated.mime_type, "image/png");
        assert!(!root.exists());
    }

    #[test]
    fn delete_requires_a_uuid() {
        assert!(Cli::try_parse_from(["intake", "delete", "not-a-uuid"]).is_err());
        let id = Uuid::new_v4();
        let cli = Cli::try_parse_from(["intake", "delete", &id.to_string()]).unwrap();
        assert!(matches!(cli.command, Commands::Delete { id: parsed } if parsed == id));
    }
}
