//! Configuration module
//!
//! `UploaderConfig` is built once at startup (defaults, then an optional TOML file,
//! then `INTAKE_*` environment overrides), validated, and shared read-only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::mime_table::MimeTable;
use crate::models::FileTypeCategory;

const DEFAULT_DISK: &str = "public";
const DEFAULT_PATH: &str = "files";
const DEFAULT_FILE_TYPE: &str = "any";
const DEFAULT_NAME_LENGTH: usize = 40;
const DEFAULT_URL_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Environment variable naming a TOML file to load before overrides are applied.
pub const CONFIG_PATH_ENV: &str = "INTAKE_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskSettings {
    pub root: PathBuf,
    /// Public URL prefix; `None` means the disk is not web-addressable.
    pub base_url: Option<String>,
}

impl Default for DiskSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("storage/app"),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Name of the disk new artifacts are written to
    pub disk: String,
    /// Base relative path under the disk root
    pub path: String,
    pub disks: BTreeMap<String, DiskSettings>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        let mut disks = BTreeMap::new();
        disks.insert(
            "public".to_string(),
            DiskSettings {
                root: PathBuf::from("storage/app/public"),
                base_url: Some("/storage".to_string()),
            },
        );
        disks.insert("local".to_string(), DiskSettings::default());
        Self {
            disk: DEFAULT_DISK.to_string(),
            path: DEFAULT_PATH.to_string(),
            disks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSettings {
    pub file_type: String,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            file_type: DEFAULT_FILE_TYPE.to_string(),
        }
    }
}

/// How stored names are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingStrategy {
    /// Slug of the original stem
    Original,
    /// `<epoch seconds>_<10 random alphanumerics>`
    Timestamp,
    #[default]
    Random,
}

impl NamingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingStrategy::Original => "original",
            NamingStrategy::Timestamp => "timestamp",
            NamingStrategy::Random => "random",
        }
    }
}

impl FromStr for NamingStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "original" => Ok(NamingStrategy::Original),
            "timestamp" => Ok(NamingStrategy::Timestamp),
            "random" => Ok(NamingStrategy::Random),
            other => Err(anyhow::anyhow!("Unknown naming strategy: {}", other)),
        }
    }
}

impl Display for NamingStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingSettings {
    pub strategy: NamingStrategy,
    /// Length of generated random names
    pub length: usize,
}

impl Default for NamingSettings {
    fn default() -> Self {
        Self {
            strategy: NamingStrategy::default(),
            length: DEFAULT_NAME_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlValidationSettings {
    /// Whole-request timeout in seconds
    pub timeout: u64,
    pub user_agent: String,
    /// Issue a HEAD request before downloading
    pub probe_headers: bool,
    /// Staging directory for downloads; the OS temp dir when unset
    pub temp_dir: Option<PathBuf>,
}

impl Default for UrlValidationSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_URL_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            probe_headers: false,
            temp_dir: None,
        }
    }
}

impl UrlValidationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    pub url: UrlValidationSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
}

/// Complete uploader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploaderConfig {
    pub storage: StorageSettings,
    pub defaults: DefaultSettings,
    pub naming: NamingSettings,
    /// Category table. A `[file_types]` section replaces the built-in table entirely.
    pub file_types: BTreeMap<String, FileTypeCategory>,
    pub validation: ValidationSettings,
    pub database: DatabaseSettings,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            storage: StorageSettings::default(),
            defaults: DefaultSettings::default(),
            naming: NamingSettings::default(),
            file_types: default_file_types(),
            validation: ValidationSettings::default(),
            database: DatabaseSettings::default(),
        }
    }
}

fn default_file_types() -> BTreeMap<String, FileTypeCategory> {
    let categories = [
        FileTypeCategory::new(
            "image",
            &["jpg", "jpeg", "png", "gif", "webp", "bmp", "svg"],
            5120,
        ),
        FileTypeCategory::new("video", &["mp4", "mkv", "avi", "mov", "webm"], 51200),
        FileTypeCategory::new("pdf", &["pdf"], 10240),
        FileTypeCategory::new(
            "document",
            &["doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "rtf"],
            20480,
        ),
        FileTypeCategory::new("excel", &["xls", "xlsx", "csv"], 10240),
        FileTypeCategory::new("audio", &["mp3", "wav", "ogg", "aac", "flac"], 20480),
        FileTypeCategory::new("archive", &["zip", "rar", "7z", "tar", "gz"], 51200),
        FileTypeCategory::new(
            "any",
            &[
                "jpg", "jpeg", "png", "gif", "webp", "bmp", "svg", "mp4", "mkv", "avi", "mov",
                "webm", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "rtf", "csv",
                "mp3", "wav", "zip", "rar",
            ],
            5120,
        ),
    ];
    categories
        .into_iter()
        .map(|c| (c.name.clone(), c))
        .collect()
}

impl UploaderConfig {
    /// Parses a TOML document; sections it omits keep their defaults.
    pub fn from_toml_str(data: &str) -> Result<Self, anyhow::Error> {
        let mut cfg: UploaderConfig = toml::from_str(data)?;
        cfg.normalize();
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
        let cfg = Self::from_toml_str(&data)?;
        tracing::debug!(path = %path.display(), "Loaded uploader config");
        Ok(cfg)
    }

    /// Loads `.env`, then the file named by `INTAKE_CONFIG` (if any), then applies
    /// `INTAKE_*` overrides and validates the result.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::load(None)
    }

    /// Like [`from_env`](Self::from_env), but an explicit `path` wins over `INTAKE_CONFIG`.
    pub fn load(path: Option<&Path>) -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let mut cfg = match (path, env::var(CONFIG_PATH_ENV)) {
            (Some(path), _) => Self::from_file(path)?,
            (None, Ok(path)) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        cfg.apply_env_overrides_from(|key| env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    /// Applies scalar overrides read through `lookup`. Unparseable values keep the
    /// current setting.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(disk) = lookup("INTAKE_STORAGE_DISK") {
            self.storage.disk = disk;
        }
        if let Some(path) = lookup("INTAKE_STORAGE_PATH") {
            self.storage.path = path;
        }
        if let Some(file_type) = lookup("INTAKE_DEFAULT_FILE_TYPE") {
            self.defaults.file_type = file_type;
        }
        if let Some(strategy) = lookup("INTAKE_NAMING_STRATEGY") {
            self.naming.strategy = strategy.parse().unwrap_or(self.naming.strategy);
        }
        if let Some(length) = lookup("INTAKE_NAMING_LENGTH") {
            self.naming.length = length.parse().unwrap_or(self.naming.length);
        }

        let url = &mut self.validation.url;
        if let Some(timeout) = lookup("INTAKE_URL_TIMEOUT") {
            url.timeout = timeout.parse().unwrap_or(url.timeout);
        }
        if let Some(user_agent) = lookup("INTAKE_URL_USER_AGENT") {
            url.user_agent = user_agent;
        }
        if let Some(probe) = lookup("INTAKE_URL_PROBE_HEADERS") {
            url.probe_headers = probe.parse().unwrap_or(url.probe_headers);
        }
        if let Some(temp_dir) = lookup("INTAKE_URL_TEMP_DIR") {
            url.temp_dir = Some(PathBuf::from(temp_dir));
        }

        if let Some(database_url) = lookup("DATABASE_URL") {
            self.database.url = Some(database_url);
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.storage.disks.contains_key(&self.storage.disk) {
            return Err(anyhow::anyhow!(
                "storage.disk '{}' is not defined under storage.disks",
                self.storage.disk
            ));
        }

        if self.naming.length == 0 {
            return Err(anyhow::anyhow!("naming.length must be greater than 0"));
        }

        if self.validation.url.timeout == 0 {
            return Err(anyhow::anyhow!(
                "validation.url.timeout must be greater than 0"
            ));
        }

        let table = MimeTable::standard();
        for (name, category) in &self.file_types {
            if category.mimes.is_empty() {
                return Err(anyhow::anyhow!(
                    "file_types.{} must allow at least one extension",
                    name
                ));
            }
            if category.max_size == 0 {
                return Err(anyhow::anyhow!(
                    "file_types.{}.max_size must be greater than 0",
                    name
                ));
            }
            if let Some(unknown) = category.mimes.iter().find(|e| !table.is_known_extension(e)) {
                return Err(anyhow::anyhow!(
                    "file_types.{} lists unknown extension '{}'",
                    name,
                    unknown
                ));
            }
        }

        if !self.file_types.contains_key(&self.defaults.file_type) {
            return Err(anyhow::anyhow!(
                "defaults.file_type '{}' is not a configured file type",
                self.defaults.file_type
            ));
        }

        Ok(())
    }

    pub fn category(&self, name: &str) -> Option<&FileTypeCategory> {
        self.file_types.get(name)
    }

    pub fn categories(&self) -> impl Iterator<Item = &FileTypeCategory> {
        self.file_types.values()
    }

    // Map keys are authoritative for category names; extensions are compared lowercase.
    fn normalize(&mut self) {
        for (name, category) in self.file_types.iter_mut() {
            category.name = name.clone();
            for ext in category.mimes.iter_mut() {
                *ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let cfg = UploaderConfig::default();
        assert_eq!(cfg.storage.disk, "public");
        assert_eq!(cfg.storage.path, "files");
        assert_eq!(cfg.naming.strategy, NamingStrategy::Random);
        assert_eq!(cfg.naming.length, 40);
        assert_eq!(cfg.validation.url.timeout(), Duration::from_secs(60));
        assert!(!cfg.validation.url.probe_headers);
        assert_eq!(cfg.category("image").unwrap().max_size, 5120);
        assert_eq!(cfg.category("video").unwrap().max_size, 51200);
        assert_eq!(cfg.categories().count(), 8);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = r#"
            [storage]
            path = "uploads"

            [naming]
            strategy = "timestamp"
        "#;
        let cfg = UploaderConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.storage.path, "uploads");
        assert_eq!(cfg.storage.disk, "public");
        assert_eq!(cfg.naming.strategy, NamingStrategy::Timestamp);
        assert_eq!(cfg.naming.length, 40);
        assert!(cfg.category("pdf").is_some());
    }

    #[test]
    fn test_file_types_section_replaces_table() {
        let toml = r#"
            [defaults]
            file_type = "pics"

            [file_types.pics]
            mimes = ["PNG", ".jpg"]
            max_size = 10
        "#;
        let cfg = UploaderConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.categories().count(), 1);
        let pics = cfg.category("pics").unwrap();
        assert_eq!(pics.name, "pics");
        assert_eq!(pics.mimes, vec!["png".to_string(), "jpg".to_string()]);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.toml");
        std::fs::write(&path, "[naming]\nlength = 12\n").unwrap();

        let cfg = UploaderConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.storage.disk, "public");
        assert!(cfg.category("image").is_some());

        assert!(UploaderConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("INTAKE_STORAGE_PATH", "media"),
            ("INTAKE_NAMING_STRATEGY", "original"),
            ("INTAKE_NAMING_LENGTH", "not-a-number"),
            ("INTAKE_URL_TIMEOUT", "5"),
            ("INTAKE_URL_PROBE_HEADERS", "true"),
            ("DATABASE_URL", "postgresql://localhost/intake"),
        ]
        .into_iter()
        .collect();

        let mut cfg = UploaderConfig::default();
        cfg.apply_env_overrides_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(cfg.storage.path, "media");
        assert_eq!(cfg.naming.strategy, NamingStrategy::Original);
        assert_eq!(cfg.naming.length, 40);
        assert_eq!(cfg.validation.url.timeout, 5);
        assert!(cfg.validation.url.probe_headers);
        assert_eq!(
            cfg.database.url.as_deref(),
            Some("postgresql://localhost/intake")
        );
    }

    #[test]
    fn test_validate_rejects_inconsistent_config() {
        let mut cfg = UploaderConfig::default();
        cfg.storage.disk = "s3".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = UploaderConfig::default();
        cfg.defaults.file_type = "nope".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = UploaderConfig::default();
        cfg.file_types
            .insert("weird".to_string(), FileTypeCategory::new("weird", &["exe"], 10));
        assert!(cfg.validate().is_err());

        let mut cfg = UploaderConfig::default();
        cfg.naming.length = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_naming_strategy_parse() {
        assert_eq!(
            "Original".parse::<NamingStrategy>().unwrap(),
            NamingStrategy::Original
        );
        assert!("uuid".parse::<NamingStrategy>().is_err());
    }
}
