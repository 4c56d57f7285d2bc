//! Extension ↔ MIME table
//!
//! The single source of truth for which MIME type an extension stands for, and which
//! extension a detected MIME type is stored under. Several extensions may share one
//! MIME type; the first entry for a MIME type is its canonical extension.

/// (extension, canonical MIME type). Order matters for the reverse lookup.
const ENTRIES: &[(&str, &str)] = &[
    // Images
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    // Videos
    ("mp4", "video/mp4"),
    ("mkv", "video/x-matroska"),
    ("avi", "video/x-msvideo"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    // Audio
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("aac", "audio/aac"),
    ("flac", "audio/flac"),
    // Documents
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("txt", "text/plain"),
    ("rtf", "application/rtf"),
    ("csv", "text/csv"),
    // Archives
    ("zip", "application/zip"),
    ("rar", "application/vnd.rar"),
    ("7z", "application/x-7z-compressed"),
    ("tar", "application/x-tar"),
    ("gz", "application/gzip"),
];

/// Non-canonical spellings emitted by sniffers and servers, mapped to the canonical type.
const ALIASES: &[(&str, &str)] = &[
    ("image/jpg", "image/jpeg"),
    ("image/pjpeg", "image/jpeg"),
    ("image/x-ms-bmp", "image/bmp"),
    ("audio/x-wav", "audio/wav"),
    ("audio/wave", "audio/wav"),
    ("audio/vnd.wave", "audio/wav"),
    ("audio/x-flac", "audio/flac"),
    ("audio/mp3", "audio/mpeg"),
    ("audio/x-aac", "audio/aac"),
    ("video/ogg", "audio/ogg"),
    ("application/ogg", "audio/ogg"),
    ("text/rtf", "application/rtf"),
    ("application/x-rar-compressed", "application/vnd.rar"),
    ("application/x-zip-compressed", "application/zip"),
    ("application/x-gzip", "application/gzip"),
];

/// Extension used when a MIME type has no entry in the table.
pub const FALLBACK_EXTENSION: &str = "bin";

/// Bidirectional extension/MIME lookup.
#[derive(Debug, Clone, Copy)]
pub struct MimeTable {
    entries: &'static [(&'static str, &'static str)],
    aliases: &'static [(&'static str, &'static str)],
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl MimeTable {
    pub const fn standard() -> Self {
        Self {
            entries: ENTRIES,
            aliases: ALIASES,
        }
    }

    /// Canonical MIME type for an extension (case-insensitive, leading dot tolerated).
    pub fn mime_for_extension(&self, extension: &str) -> Option<&'static str> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, mime)| *mime)
    }

    /// Canonical extension for a MIME type, after alias resolution.
    pub fn extension_for_mime(&self, mime: &str) -> Option<&'static str> {
        let canonical = self.canonicalize(mime);
        self.entries
            .iter()
            .find(|(_, m)| *m == canonical)
            .map(|(ext, _)| *ext)
    }

    /// Like [`extension_for_mime`](Self::extension_for_mime) but falls back to `bin`.
    pub fn extension_or_fallback(&self, mime: &str) -> &'static str {
        self.extension_for_mime(mime).unwrap_or(FALLBACK_EXTENSION)
    }

    /// Normalizes case, strips parameters (`; charset=...`) and resolves aliases.
    pub fn canonicalize(&self, mime: &str) -> String {
        let bare = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.aliases
            .iter()
            .find(|(alias, _)| *alias == bare)
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or(bare)
    }

    /// MIME types allowed by a list of extensions. Unknown extensions contribute nothing.
    pub fn mimes_for_extensions<'a>(
        &self,
        extensions: impl IntoIterator<Item = &'a String>,
    ) -> Vec<&'static str> {
        let mut mimes: Vec<&'static str> = Vec::new();
        for ext in extensions {
            if let Some(mime) = self.mime_for_extension(ext) {
                if !mimes.contains(&mime) {
                    mimes.push(mime);
                }
            }
        }
        mimes
    }

    pub fn is_known_extension(&self, extension: &str) -> bool {
        self.mime_for_extension(extension).is_some()
    }
}
