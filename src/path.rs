use std::path::{Component, Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS};

use crate::error::HttpError;
use crate::options::Dotfiles;

/// Characters a `Location` header's path component must escape, deliberately
/// excluding `%` itself so re-encoding an already-encoded string is a no-op
/// (the idempotence the spec's `encode_url` contract requires).
const PATH_UNSAFE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}');

/// Percent-encode a path for use in a `Location` header. Idempotent:
/// encoding an already-encoded string leaves it unchanged, because `%` is
/// never itself escaped.
pub fn encode_url(input: &str) -> String {
    percent_encoding::utf8_percent_encode(input, PATH_UNSAFE).to_string()
}

/// Collapse any run of two or more leading `/` into a single `/`.
pub fn collapse_leading_slashes(input: &str) -> String {
    let trimmed = input.trim_start_matches('/');
    if trimmed.len() == input.len() {
        input.to_owned()
    } else {
        format!("/{}", trimmed)
    }
}

/// The result of resolving a request pathname against an (optional) sandbox
/// root: a filesystem path ready to `stat`, plus the decoded path components
/// recorded for dotfile inspection.
pub struct ResolvedPath {
    /// The path to stat/open on disk.
    pub full_path: PathBuf,
    /// Decoded, normalized path components (no `.`/`..`/empty entries).
    pub components: Vec<String>,
    /// Whether the original request pathname ended in `/`.
    pub is_dir_request: bool,
}

/// A dotfile component is any path segment longer than one character that
/// starts with `.` (so `.` and `..` themselves never count).
pub fn is_dotfile(component: &str) -> bool {
    component.len() > 1 && component.starts_with('.')
}

/// Percent-decode a raw request pathname. A `%`-escape that doesn't decode
/// to valid UTF-8 is reported as `400 Bad Request` with no further detail,
/// per the spec's "no information leak" note.
fn decode_percents(raw: &str) -> Result<String, HttpError> {
    percent_encoding::percent_decode_str(raw)
        .decode_utf8()
        .map(|cow| cow.into_owned())
        .map_err(|_| HttpError::bad_request("Bad Request"))
}

/// Split a decoded pathname into normalized components, rejecting any
/// literal `..` segment lexically — this crate never silently clamps a
/// traversal attempt back to the root, it refuses the request outright,
/// with or without a configured root.
fn normalize_components(decoded: &str) -> Result<Vec<String>, HttpError> {
    let mut out = Vec::new();
    for seg in decoded.split('/') {
        if seg.is_empty() || seg == "." {
            continue;
        }
        if seg == ".." {
            return Err(HttpError::forbidden("Forbidden"));
        }
        // Guard against a component smuggling extra path separators past
        // the lexical split (e.g. an embedded Windows drive letter such as
        // `c:` or a backslash), the same defense-in-depth the teacher crate
        // applies in `normalize_path`.
        let reparsed_is_plain = Path::new(seg)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !reparsed_is_plain {
            return Err(HttpError::forbidden("Forbidden"));
        }
        out.push(seg.to_owned());
    }
    Ok(out)
}

/// Resolve a raw (percent-encoded) request pathname to a filesystem path.
///
/// Implements spec §4.1 "Path resolution" steps 1-5.
pub fn resolve_path(root: Option<&Path>, raw_pathname: &str) -> Result<ResolvedPath, HttpError> {
    if raw_pathname.as_bytes().contains(&0) {
        return Err(HttpError::bad_request("Bad Request"));
    }

    let decoded = decode_percents(raw_pathname)?;
    if decoded.as_bytes().contains(&0) {
        return Err(HttpError::bad_request("Bad Request"));
    }

    let is_dir_request = decoded.as_bytes().last() == Some(&b'/');
    let components = normalize_components(&decoded)?;

    let full_path = match root {
        Some(root) => {
            let mut buf = root.to_path_buf();
            buf.extend(components.iter());
            buf
        }
        None => {
            let mut buf = PathBuf::from(Component::RootDir.as_os_str());
            buf.extend(components.iter());
            buf
        }
    };

    Ok(ResolvedPath {
        full_path,
        components,
        is_dir_request,
    })
}

/// Apply the configured dotfile policy to a resolved path's components.
/// Returns `Ok(())` when the request may proceed.
pub fn check_dotfiles(components: &[String], policy: Dotfiles) -> Result<(), HttpError> {
    match policy {
        Dotfiles::Allow => Ok(()),
        Dotfiles::Deny => {
            if components.iter().any(|c| is_dotfile(c)) {
                tracing::debug!("rejecting dotfile path (deny policy)");
                Err(HttpError::forbidden("Forbidden"))
            } else {
                Ok(())
            }
        }
        Dotfiles::Ignore => {
            if components.iter().any(|c| is_dotfile(c)) {
                tracing::debug!("hiding dotfile path (ignore policy)");
                Err(HttpError::not_found())
            } else {
                Ok(())
            }
        }
        Dotfiles::Legacy => {
            if components.first().map(|c| is_dotfile(c)).unwrap_or(false) {
                tracing::debug!("hiding dotfile path (legacy policy, top-level only)");
                Err(HttpError::not_found())
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_nul_byte() {
        let err = resolve_path(None, "/foo\0bar").unwrap_err();
        assert_eq!(err.status, http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rejects_dotdot_without_root() {
        let err = resolve_path(None, "/../etc/passwd").unwrap_err();
        assert_eq!(err.status, http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn rejects_percent_encoded_dotdot_with_root() {
        let err = resolve_path(Some(Path::new("/srv")), "/%2e%2e/etc/passwd").unwrap_err();
        assert_eq!(err.status, http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn resolves_under_root() {
        let resolved = resolve_path(Some(Path::new("/srv")), "/a/b.txt").unwrap();
        assert_eq!(resolved.full_path, Path::new("/srv/a/b.txt"));
        assert_eq!(resolved.components, vec!["a", "b.txt"]);
        assert!(!resolved.is_dir_request);
    }

    #[test]
    fn resolves_absolute_without_root() {
        let resolved = resolve_path(None, "/a/b.txt").unwrap();
        assert_eq!(resolved.full_path, Path::new("/a/b.txt"));
    }

    #[test]
    fn detects_dir_request() {
        let resolved = resolve_path(Some(Path::new("/srv")), "/a/").unwrap();
        assert!(resolved.is_dir_request);
    }

    #[test]
    fn dotfile_component_detection() {
        assert!(!is_dotfile("."));
        assert!(!is_dotfile(".."));
        assert!(!is_dotfile("a"));
        assert!(is_dotfile(".git"));
    }

    #[test]
    fn legacy_policy_allows_nested_dotdir_contents() {
        check_dotfiles(&["public".into(), ".well-known".into(), "x".into()], Dotfiles::Legacy)
            .expect("nested dotfile dir allowed under legacy policy");
    }

    #[test]
    fn legacy_policy_hides_leading_dotfile() {
        let err = check_dotfiles(&[".env".into()], Dotfiles::Legacy).unwrap_err();
        assert_eq!(err.status, http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn ignore_policy_checks_every_component() {
        let err = check_dotfiles(&["public".into(), ".secret".into()], Dotfiles::Ignore).unwrap_err();
        assert_eq!(err.status, http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn deny_policy_is_forbidden() {
        let err = check_dotfiles(&[".git".into()], Dotfiles::Deny).unwrap_err();
        assert_eq!(err.status, http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn encode_url_is_idempotent() {
        let once = encode_url("/a b/c#d");
        let twice = encode_url(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn collapse_leading_slashes_keeps_single_slash() {
        assert_eq!(collapse_leading_slashes("//mnt/sub/"), "/mnt/sub/");
        assert_eq!(collapse_leading_slashes("/mnt/sub/"), "/mnt/sub/");
        assert_eq!(collapse_leading_slashes("mnt/sub/"), "mnt/sub/");
    }
}
