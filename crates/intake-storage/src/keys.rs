//! Storage key construction.
//!
//! Key format: `{storage.path}/{sanitized folder}/{stored name}`, `/`-separated and
//! relative to the disk root.

/// Sanitizes a caller-supplied folder into a relative key prefix.
///
/// - Treats `\` as a separator
/// - Drops empty, `.` and `..` segments
/// - Replaces every character outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize_folder(folder: &str) -> String {
    folder
        .replace('\\', "/")
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .map(|segment| {
            segment
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                        c
                    } else {
                        '_'
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Directory new artifacts land in: the base path joined with the sanitized folder.
pub fn destination_directory(base_path: &str, folder: Option<&str>) -> String {
    let base = sanitize_folder(base_path);
    let folder = folder.map(sanitize_folder).unwrap_or_default();
    join_key(&base, &folder)
}

/// Joins two key fragments with exactly one `/`, ignoring empty fragments.
pub fn join_key(directory: &str, name: &str) -> String {
    let directory = directory.trim_matches('/');
    let name = name.trim_matches('/');
    match (directory.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (_, true) => directory.to_string(),
        _ => format!("{}/{}", directory, name),
    }
}
