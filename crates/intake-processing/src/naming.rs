//! Stored-name generation.

use intake_core::NamingStrategy;
use rand::distr::Alphanumeric;
use rand::Rng;
use std::path::Path;

const TIMESTAMP_SUFFIX_LEN: usize = 10;
const FALLBACK_STEM: &str = "file";

/// Builds stored names as `<stem>.<extension>`. The extension always comes from the
/// detected MIME type, never from the declared name.
#[derive(Debug, Clone, Copy)]
pub struct FileNamer {
    strategy: NamingStrategy,
    length: usize,
}

impl FileNamer {
    pub fn new(strategy: NamingStrategy, length: usize) -> Self {
        Self { strategy, length }
    }

    pub fn generate(&self, original_name: &str, extension: &str) -> String {
        let stem = match self.strategy {
            NamingStrategy::Original => slugify_stem(original_name),
            NamingStrategy::Timestamp => format!(
                "{}_{}",
                chrono::Utc::now().timestamp(),
                random_alphanumeric(TIMESTAMP_SUFFIX_LEN)
            ),
            NamingStrategy::Random => random_alphanumeric(self.length),
        };
        format!("{}.{}", stem, extension)
    }

    /// A variant of `name` with a random suffix, for when `name` is already taken.
    pub fn disambiguate(&self, name: &str) -> String {
        let path = Path::new(name);
        let suffix = random_alphanumeric(6).to_lowercase();
        match (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|e| e.to_str()),
        ) {
            (Some(stem), Some(ext)) => format!("{}-{}.{}", stem, suffix, ext),
            _ => format!("{}-{}", name, suffix),
        }
    }
}

/// Lowercase ASCII slug of the name without its extension; `file` when nothing survives.
pub fn slugify_stem(original_name: &str) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let mut slug = String::with_capacity(stem.len());
    let mut pending_dash = false;
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        slug
    }
}

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
