use std::time::SystemTime;

use crate::etag::parse_http_date;

/// An inclusive byte range, `start <= end < len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes this range covers.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Outcome of parsing a `Range` header against an effective length,
/// mirroring the three-way contract from spec §4.3: malformed (no
/// `bytes=` prefix), unsatisfiable (parsed to zero usable ranges), or a
/// satisfiable, possibly multi-range, result.
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParse {
    /// The header didn't match `^ *bytes=`.
    Malformed,
    /// The header matched, but no range within it was satisfiable.
    Unsatisfiable,
    /// At least one satisfiable range, in request order (after optional
    /// combining of overlapping/adjacent ranges).
    Satisfiable(Vec<ByteRange>),
}

fn parse_one_range(spec: &str, len: u64) -> Option<ByteRange> {
    if len == 0 {
        return None;
    }
    if let Some(suffix) = spec.strip_prefix('-') {
        let n: u64 = suffix.parse().ok()?;
        if n == 0 {
            return None;
        }
        let start = len.saturating_sub(n);
        return Some(ByteRange { start, end: len - 1 });
    }
    let dash_idx = spec.find('-')?;
    let (start_s, rest) = spec.split_at(dash_idx);
    let end_s = &rest[1..];
    let start: u64 = start_s.parse().ok()?;
    if end_s.is_empty() {
        if start >= len {
            return None;
        }
        return Some(ByteRange { start, end: len - 1 });
    }
    let end: u64 = end_s.parse().ok()?;
    if start > end || start >= len {
        return None;
    }
    Some(ByteRange {
        start,
        end: end.min(len - 1),
    })
}

/// Parse a `Range` header value against the effective length `len`.
///
/// When `combine` is set, overlapping and adjacent ranges are merged; the
/// merged output is stable-sorted back into the order the client's
/// range-specs originally appeared in (spec §9's design note), using the
/// lowest original index among each merged group as the sort key.
pub fn parse_range(len: u64, header_value: &str, combine: bool) -> RangeParse {
    let value = header_value.trim_start_matches(' ');
    let rest = match value.strip_prefix("bytes=") {
        Some(r) => r,
        None => return RangeParse::Malformed,
    };

    let mut parsed: Vec<(usize, ByteRange)> = Vec::new();
    for (idx, spec) in rest.split(',').enumerate() {
        if let Some(range) = parse_one_range(spec.trim(), len) {
            parsed.push((idx, range));
        }
    }

    if parsed.is_empty() {
        return RangeParse::Unsatisfiable;
    }

    if !combine {
        return RangeParse::Satisfiable(parsed.into_iter().map(|(_, r)| r).collect());
    }

    let mut by_start = parsed;
    by_start.sort_by_key(|(_, r)| r.start);

    let mut merged: Vec<(usize, ByteRange)> = Vec::new();
    for (idx, r) in by_start {
        let should_merge = merged
            .last()
            .map(|(_, last)| r.start <= last.end.saturating_add(1))
            .unwrap_or(false);
        if should_merge {
            let last = merged.last_mut().unwrap();
            if r.end > last.1.end {
                last.1.end = r.end;
            }
            if idx < last.0 {
                last.0 = idx;
            }
        } else {
            merged.push((idx, r));
        }
    }

    merged.sort_by_key(|(idx, _)| *idx);
    RangeParse::Satisfiable(merged.into_iter().map(|(_, r)| r).collect())
}

/// Evaluate `If-Range` freshness: `true` means the stored `Range` header
/// should still be honored, `false` means to fall back to a full response.
///
/// Known quirk, preserved intentionally (spec §9 open question): an
/// `If-Range` value is classified as an ETag whenever it contains a `"`,
/// which will misclassify a date that happens to contain a stray quote.
pub fn if_range_fresh(value: &str, etag: Option<&str>, last_modified: Option<SystemTime>) -> bool {
    if value.contains('"') {
        match etag {
            Some(etag) => etag == value,
            None => false,
        }
    } else {
        match (parse_http_date(value), last_modified) {
            (Some(since), Some(lm)) => lm <= since,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_without_equals() {
        assert_eq!(parse_range(100, "bytes", false), RangeParse::Malformed);
        assert_eq!(parse_range(100, "nonsense", false), RangeParse::Malformed);
    }

    #[test]
    fn single_range() {
        match parse_range(6, "bytes=1-3", false) {
            RangeParse::Satisfiable(v) => assert_eq!(v, vec![ByteRange { start: 1, end: 3 }]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn suffix_range_clamped() {
        match parse_range(3, "bytes=-5", false) {
            RangeParse::Satisfiable(v) => assert_eq!(v, vec![ByteRange { start: 0, end: 2 }]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn prefix_range_beyond_size_is_unsatisfiable() {
        assert_eq!(parse_range(5, "bytes=10-", false), RangeParse::Unsatisfiable);
    }

    #[test]
    fn single_byte_range() {
        match parse_range(10, "bytes=0-0", false) {
            RangeParse::Satisfiable(v) => assert_eq!(v, vec![ByteRange { start: 0, end: 0 }]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn combine_merges_overlapping_and_adjacent() {
        match parse_range(100, "bytes=0-10,5-15,20-25,26-30", true) {
            RangeParse::Satisfiable(v) => {
                assert_eq!(
                    v,
                    vec![ByteRange { start: 0, end: 15 }, ByteRange { start: 20, end: 30 }]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn combine_preserves_original_request_order() {
        // The second spec (50-60) should sort before the first (0-10) in the
        // output because it appeared later in the request and the two don't
        // merge, but the *non-merging* group ordering must still reflect
        // each group's earliest original index, not numeric range order.
        match parse_range(100, "bytes=50-60,0-10", true) {
            RangeParse::Satisfiable(v) => {
                assert_eq!(
                    v,
                    vec![ByteRange { start: 50, end: 60 }, ByteRange { start: 0, end: 10 }]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn combined_ranges_are_pairwise_non_overlapping_and_non_adjacent() {
        match parse_range(1000, "bytes=0-9,10-19,100-109,500-509,505-520", true) {
            RangeParse::Satisfiable(v) => {
                for w in v.windows(2) {
                    assert!(w[1].start > w[0].end + 1, "ranges {:?} overlap or touch", w);
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn multiple_ranges_without_combine_preserve_order_uncombined() {
        match parse_range(100, "bytes=10-20,0-5", false) {
            RangeParse::Satisfiable(v) => {
                assert_eq!(
                    v,
                    vec![ByteRange { start: 10, end: 20 }, ByteRange { start: 0, end: 5 }]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn if_range_quoted_value_is_treated_as_etag() {
        assert!(if_range_fresh("\"abc\"", Some("\"abc\""), None));
        assert!(!if_range_fresh("\"abc\"", Some("\"def\""), None));
    }

    #[test]
    fn if_range_date_compares_to_last_modified() {
        use std::time::{Duration, UNIX_EPOCH};
        let lm = UNIX_EPOCH + Duration::from_secs(1000);
        let date = httpdate::fmt_http_date(lm);
        assert!(if_range_fresh(&date, None, Some(lm)));
    }
}
