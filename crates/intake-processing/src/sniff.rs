//! Content-based MIME detection.
//!
//! Binary formats are recognised by magic bytes (`infer`). Text formats have no magic
//! bytes, so they are recognised from the content itself: RTF header, SVG root element,
//! CSV shape, then plain text.

use intake_core::{IngestError, IngestResult, MimeTable};
use std::borrow::Cow;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Text heuristics only look at this much of the content.
const TEXT_WINDOW: usize = 8 * 1024;
const CSV_SAMPLE_RECORDS: usize = 10;
/// Non-UTF-8 content is text when at most one byte in this many is a control byte.
const CONTROL_BYTE_RATIO: usize = 100;

/// Detects the MIME type of `data` from its content. The result is canonical.
pub fn detect_mime(data: &[u8]) -> IngestResult<String> {
    if data.is_empty() {
        return Err(IngestError::EmptyContent);
    }

    let table = MimeTable::standard();
    let window = &data[..data.len().min(TEXT_WINDOW)];
    let truncated = data.len() > TEXT_WINDOW;
    let text = text_prefix(window, truncated);
    let text = text.as_deref();

    if window.starts_with(b"{\\rtf") {
        return Ok("application/rtf".to_string());
    }

    // Before infer, which reports `<?xml` documents as text/xml.
    if let Some(text) = text {
        if looks_like_svg(text) {
            return Ok("image/svg+xml".to_string());
        }
    }

    if let Some(kind) = infer::get(data) {
        return Ok(table.canonicalize(kind.mime_type()));
    }

    match text {
        Some(text) if looks_like_csv(text, truncated) => Ok("text/csv".to_string()),
        Some(_) => Ok("text/plain".to_string()),
        None => Ok(OCTET_STREAM.to_string()),
    }
}

/// The window as text. UTF-8 is taken as is; a multi-byte character cut off by the
/// window boundary is tolerated when the content continues past it. Anything else is
/// read as a single-byte encoding (Latin-1, Windows-1252) when control bytes are rare.
fn text_prefix(window: &[u8], truncated: bool) -> Option<Cow<'_, str>> {
    if window.contains(&0) {
        return None;
    }
    match std::str::from_utf8(window) {
        Ok(text) => return Some(Cow::Borrowed(text)),
        Err(e) if truncated && e.error_len().is_none() => {
            return std::str::from_utf8(&window[..e.valid_up_to()])
                .ok()
                .map(Cow::Borrowed);
        }
        Err(_) => {}
    }

    let controls = window.iter().filter(|b| is_binary_control(**b)).count();
    if controls * CONTROL_BYTE_RATIO > window.len() {
        return None;
    }
    Some(Cow::Owned(window.iter().copied().map(char::from).collect()))
}

fn is_binary_control(byte: u8) -> bool {
    (byte < 0x20 && !matches!(byte, b'\t' | b'\n' | b'\r' | 0x0C | 0x1B)) || byte == 0x7F
}

fn looks_like_svg(text: &str) -> bool {
    let head = text.trim_start_matches('\u{feff}').trim_start();
    if head.starts_with("<svg") {
        return true;
    }
    (head.starts_with("<?xml") || head.starts_with("<!DOCTYPE svg") || head.starts_with("<!--"))
        && head.contains("<svg")
}

/// At least two records with the same number (two or more) of fields. Fields follow
/// RFC 4180 quoting, so delimiters and line breaks inside quotes do not count.
fn looks_like_csv(text: &str, truncated: bool) -> bool {
    [',', ';', '\t'].iter().any(|delimiter| {
        let counts = field_counts(text, *delimiter, truncated);
        counts.len() >= 2 && counts[0] >= 2 && counts.iter().all(|n| *n == counts[0])
    })
}

/// Field count of each complete, non-blank record in `text`, up to the sample size.
/// The trailing record is dropped when it is still inside quotes or cut off by the window.
fn field_counts(text: &str, delimiter: char, truncated: bool) -> Vec<usize> {
    let mut counts = Vec::new();
    let mut fields = 1;
    let mut blank = true;
    let mut in_quotes = false;

    for c in text.chars() {
        match c {
            '"' => {
                // An escaped quote ("") toggles twice.
                in_quotes = !in_quotes;
                blank = false;
            }
            c if c == delimiter && !in_quotes => {
                fields += 1;
                blank = false;
            }
            '\n' if !in_quotes => {
                if !blank {
                    counts.push(fields);
                    if counts.len() == CSV_SAMPLE_RECORDS {
                        return counts;
                    }
                }
                fields = 1;
                blank = true;
            }
            c if !c.is_whitespace() => blank = false,
            _ => {}
        }
    }

    if !blank && !in_quotes && !truncated {
        counts.push(fields);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
        0x44, 0x52,
    ];

    #[test]
    fn empty_is_rejected() {
        assert!(matches!(detect_mime(b""), Err(IngestError::EmptyContent)));
    }

    #[test]
    fn magic_bytes() {
        assert_eq!(detect_mime(PNG).unwrap(), "image/png");
        assert_eq!(detect_mime(b"%PDF-1.7\n%\xe2\xe3").unwrap(), "application/pdf");
        assert_eq!(detect_mime(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]).unwrap(), "image/jpeg");
    }

    #[test]
    fn text_formats() {
        assert_eq!(detect_mime(b"{\\rtf1\\ansi hello}").unwrap(), "application/rtf");
        assert_eq!(
            detect_mime(b"<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"/>")
                .unwrap(),
            "image/svg+xml"
        );
        assert_eq!(detect_mime(b"<svg viewBox=\"0 0 1 1\"></svg>").unwrap(), "image/svg+xml");
        assert_eq!(detect_mime(b"name,age\nada,36\nalan,41\n").unwrap(), "text/csv");
        assert_eq!(detect_mime(b"just some notes\nover two lines").unwrap(), "text/plain");
    }

    #[test]
    fn ragged_commas_are_plain_text() {
        assert_eq!(
            detect_mime(b"Hello, world.\nNo commas here\n").unwrap(),
            "text/plain"
        );
    }

    #[test]
    fn quoted_delimiters_stay_in_one_field() {
        let data = b"name,description\nwidget,\"small, blue\"\ngadget,\"large\nand heavy\"\n";
        assert_eq!(detect_mime(data).unwrap(), "text/csv");
    }

    #[test]
    fn semicolon_and_tab_delimiters() {
        assert_eq!(detect_mime(b"a;b;c\n1;2;3\n").unwrap(), "text/csv");
        assert_eq!(detect_mime(b"a\tb\n1\t2\n").unwrap(), "text/csv");
    }

    #[test]
    fn long_csv_cut_mid_record_is_still_csv() {
        let row = format!("12345,{}\n", "x".repeat(1500));
        let mut data = b"id,label\n".to_vec();
        while data.len() <= TEXT_WINDOW {
            data.extend_from_slice(row.as_bytes());
        }
        assert_eq!(detect_mime(&data).unwrap(), "text/csv");
    }

    #[test]
    fn latin1_text_is_plain_text() {
        assert_eq!(
            detect_mime(b"Caf\xe9 au lait\nna\xefve r\xe9sum\xe9\n").unwrap(),
            "text/plain"
        );
    }

    #[test]
    fn unknown_binary_is_octet_stream() {
        assert_eq!(detect_mime(&[0x00, 0x01, 0x02, 0x03, 0xFE]).unwrap(), OCTET_STREAM);
    }

    #[test]
    fn long_text_cut_inside_a_character_is_still_text() {
        let mut data = vec![b'a'; TEXT_WINDOW - 1];
        data.extend_from_slice("é and more".as_bytes());
        assert_eq!(detect_mime(&data).unwrap(), "text/plain");
    }
}
