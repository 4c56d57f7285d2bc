//! Scoped temporary files for downloaded content.

use intake_core::{IngestError, IngestResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const STAGING_PREFIX: &str = "intake-";

/// Downloaded bytes staged on local disk. The file is removed when this is dropped.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
    size: u64,
}

impl StagedFile {
    /// Writes `bytes` to a new temporary file in `dir`, or the OS temp dir.
    pub async fn create(dir: Option<&Path>, bytes: Vec<u8>) -> IngestResult<Self> {
        let dir: Option<PathBuf> = dir.map(Path::to_path_buf);
        tokio::task::spawn_blocking(move || -> IngestResult<StagedFile> {
            let mut builder = tempfile::Builder::new();
            builder.prefix(STAGING_PREFIX);
            let mut file = match dir {
                Some(dir) => {
                    std::fs::create_dir_all(&dir)?;
                    builder.tempfile_in(dir)?
                }
                None => builder.tempfile()?,
            };
            file.write_all(&bytes)?;
            file.flush()?;
            Ok(StagedFile {
                file,
                size: bytes.len() as u64,
            })
        })
        .await
        .map_err(|e| IngestError::Io(std::io::Error::other(e)))?
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Removes the file now, logging instead of failing if removal does not work.
    pub fn discard(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove staged file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_staged_file_is_removed_on_discard() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedFile::create(Some(dir.path()), b"abc".to_vec())
            .await
            .unwrap();

        let path = staged.path().to_path_buf();
        assert!(path.starts_with(dir.path()));
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
        assert_eq!(staged.size(), 3);

        staged.discard();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_staged_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let staged = StagedFile::create(Some(dir.path()), b"abc".to_vec())
                .await
                .unwrap();
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
