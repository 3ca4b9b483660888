use std::time::{SystemTime, UNIX_EPOCH};

/// Metadata about a resolved file, independent of how it was opened.
///
/// Mirrors the role the teacher crate's `std::fs::Metadata` (bundled
/// straight into `ResolveResult::Found`) plays, but trimmed to exactly the
/// fields the response pipeline needs.
#[derive(Clone, Copy, Debug)]
pub struct FileStat {
    /// File size in bytes.
    pub size: u64,
    /// Last-modified time.
    pub mtime: SystemTime,
    /// Whether the stat'd path is a directory.
    pub is_directory: bool,
}

impl FileStat {
    /// Build a `FileStat` from a `std::fs::Metadata`, defaulting `mtime` to
    /// the Unix epoch on platforms that can't report it.
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        FileStat {
            size: metadata.len(),
            mtime: metadata.modified().unwrap_or(UNIX_EPOCH),
            is_directory: metadata.is_dir(),
        }
    }
}

/// Compose a weak-looking `ETag` value from a file's size and modification
/// time: `"<size-hex>-<mtime-hex>"`. The `mtime-hex` folds seconds and
/// sub-second nanoseconds into one 64-bit value so two files that differ
/// only in the sub-second portion of `mtime` still get distinct tags.
///
/// This corresponds to the external `etag(size, mtime) -> string` pure
/// function named in the spec; there is no crates.io equivalent of the npm
/// `etag` package so it's implemented directly here, following the same
/// `{size:x}-{mtime:x}` shape the teacher crate used in both
/// `static_service.rs` and `util/file_response_builder.rs`.
pub fn etag(size: u64, mtime: SystemTime) -> String {
    let since_epoch = mtime.duration_since(UNIX_EPOCH).unwrap_or_default();
    let folded = (since_epoch.as_secs() << 20) ^ u64::from(since_epoch.subsec_nanos());
    format!("\"{:x}-{:x}\"", size, folded)
}

/// Format a `SystemTime` as an HTTP-date (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn http_date(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}

/// Parse an HTTP-date header value. Invalid input yields `None`.
pub fn parse_http_date(value: &str) -> Option<SystemTime> {
    httpdate::parse_http_date(value.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etag_is_quoted_and_stable() {
        let t = UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
        let a = etag(6, t);
        let b = etag(6, t);
        assert_eq!(a, b);
        assert!(a.starts_with('"') && a.ends_with('"'));
    }

    #[test]
    fn etag_differs_by_size() {
        let t = UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
        assert_ne!(etag(6, t), etag(7, t));
    }

    #[test]
    fn http_date_roundtrip() {
        let t = UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
        let formatted = http_date(t);
        let parsed = parse_http_date(&formatted).unwrap();
        assert_eq!(parsed, t);
    }

    #[test]
    fn parse_http_date_rejects_garbage() {
        assert!(parse_http_date("not a date").is_none());
    }
}
