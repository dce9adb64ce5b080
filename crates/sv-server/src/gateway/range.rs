//! `Range` header parsing and content-type resolution.

use sv_core::{Error, MediaKind, Result};

/// An inclusive byte window within a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a resource of `size` bytes.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// A decimal byte position. Signs and empty strings are rejected; values
/// too large for `u64` saturate.
fn position(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.parse().unwrap_or(u64::MAX))
}

/// Parse a single-range `Range` header against a resource of `size` bytes.
///
/// Accepts `bytes=a-b`, `bytes=a-` and `bytes=-n`. An end past EOF is
/// clamped. Anything else, including multi-range requests and windows that
/// start at or past EOF, is [`Error::RangeNotSatisfiable`].
pub fn parse_range(value: &str, size: u64) -> Result<ByteRange> {
    let unsatisfiable = || Error::RangeNotSatisfiable { size };

    let spec = value
        .trim()
        .strip_prefix("bytes=")
        .ok_or_else(unsatisfiable)?
        .trim();
    if spec.contains(',') || size == 0 {
        return Err(unsatisfiable());
    }

    let (first, last) = spec.split_once('-').ok_or_else(unsatisfiable)?;
    let (first, last) = (first.trim(), last.trim());
    let last_byte = size - 1;

    match (first.is_empty(), last.is_empty()) {
        // bytes=-n: the final n bytes.
        (true, false) => {
            let n = position(last).ok_or_else(unsatisfiable)?;
            if n == 0 {
                return Err(unsatisfiable());
            }
            Ok(ByteRange {
                start: size.saturating_sub(n),
                end: last_byte,
            })
        }
        // bytes=a-
        (false, true) => {
            let start = position(first).ok_or_else(unsatisfiable)?;
            if start > last_byte {
                return Err(unsatisfiable());
            }
            Ok(ByteRange {
                start,
                end: last_byte,
            })
        }
        // bytes=a-b
        (false, false) => {
            let start = position(first).ok_or_else(unsatisfiable)?;
            let end = position(last).ok_or_else(unsatisfiable)?;
            if start > end || start > last_byte {
                return Err(unsatisfiable());
            }
            Ok(ByteRange {
                start,
                end: end.min(last_byte),
            })
        }
        (true, true) => Err(unsatisfiable()),
    }
}

/// Guess a MIME type from a file extension.
pub fn guess_content_type(storage_path: &str) -> Option<&'static str> {
    let ext = storage_path.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "ogv" => "video/ogg",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        _ => return None,
    };
    Some(mime)
}

/// Stored MIME type, then extension, then a per-kind fallback.
pub fn resolve_content_type(
    stored: Option<&str>,
    storage_path: &str,
    kind: MediaKind,
) -> String {
    stored
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .or_else(|| guess_content_type(storage_path).map(String::from))
        .unwrap_or_else(|| kind.fallback_content_type().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(value: &str, size: u64) -> (u64, u64) {
        let r = parse_range(value, size).unwrap();
        (r.start, r.end)
    }

    fn rejected(value: &str, size: u64) -> bool {
        matches!(
            parse_range(value, size),
            Err(Error::RangeNotSatisfiable { size: s }) if s == size
        )
    }

    #[test]
    fn closed_range() {
        let r = parse_range("bytes=0-99", 1000).unwrap();
        assert_eq!(r.len(), 100);
        assert_eq!(r.content_range(1000), "bytes 0-99/1000");
    }

    #[test]
    fn open_and_suffix_ranges() {
        assert_eq!(window("bytes=500-", 1000), (500, 999));
        assert_eq!(window("bytes=-100", 1000), (900, 999));
        assert_eq!(window("bytes=-5000", 1000), (0, 999));
    }

    #[test]
    fn end_past_eof_is_clamped() {
        assert_eq!(window("bytes=900-5000", 1000), (900, 999));
        assert_eq!(window("bytes=999-999", 1000), (999, 999));
    }

    #[test]
    fn unsatisfiable_windows() {
        assert!(rejected("bytes=2000-3000", 1000));
        assert!(rejected("bytes=1000-", 1000));
        assert!(rejected("bytes=50-10", 1000));
        assert!(rejected("bytes=-0", 1000));
        assert!(rejected("bytes=0-0", 0));
    }

    #[test]
    fn malformed_and_multi_range() {
        assert!(rejected("bytes=0-10,20-30", 1000));
        assert!(rejected("items=0-10", 1000));
        assert!(rejected("bytes=abc-def", 1000));
        assert!(rejected("bytes=-", 1000));
        assert!(rejected("bytes=10", 1000));
    }

    #[test]
    fn positions_are_plain_digits() {
        assert!(rejected("bytes=+5-10", 1000));
        assert!(rejected("bytes=5-+10", 1000));
        assert!(rejected("bytes=-+10", 1000));
        assert!(rejected("bytes=--10", 1000));
        assert_eq!(window("bytes=0-99999999999999999999999", 1000), (0, 999));
        assert!(rejected("bytes=99999999999999999999999-", 1000));
        assert_eq!(window("bytes=007-010", 1000), (7, 10));
    }

    #[test]
    fn content_type_precedence() {
        assert_eq!(
            resolve_content_type(Some("video/webm"), "a.mp4", MediaKind::Video),
            "video/webm"
        );
        assert_eq!(
            resolve_content_type(None, "deck.PDF", MediaKind::Presentation),
            "application/pdf"
        );
        assert_eq!(
            resolve_content_type(Some("  "), "scan.png", MediaKind::Image),
            "image/png"
        );
        assert_eq!(
            resolve_content_type(None, "blob", MediaKind::Video),
            "video/mp4"
        );
    }
}
