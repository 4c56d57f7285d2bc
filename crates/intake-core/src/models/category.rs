//! File-type category: a named size/type policy bucket.

use serde::{Deserialize, Serialize};

/// A named policy bucket: allowed extensions plus a size ceiling in kibibytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTypeCategory {
    #[serde(default)]
    pub name: String,
    /// Ordered set of allowed extensions (lowercase, without dot)
    pub mimes: Vec<String>,
    /// Ceiling in KiB
    pub max_size: u64,
}

impl FileTypeCategory {
    pub fn new(name: impl Into<String>, extensions: &[&str], max_size_kib: u64) -> Self {
        Self {
            name: name.into(),
            mimes: extensions.iter().map(|e| e.to_string()).collect(),
            max_size: max_size_kib,
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size.saturating_mul(1024)
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.');
        self.mimes.iter().any(|e| e.eq_ignore_ascii_case(extension))
    }
}
