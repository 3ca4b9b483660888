//! The core request-to-response state machine: resolve a pathname against
//! the filesystem, then compose the response for whatever was found.
//!
//! This splits the teacher crate's single `resolve()` + `ResponseBuilder`
//! pair (see `resolve.rs`/`response_builder.rs`) into the same two-step
//! shape, generalized to the richer status taxonomy (dotfiles, conditional
//! GET, ranges) this crate covers. [`resolve`] never touches response
//! headers; [`serve_file`]/[`build_response`] never touch the filesystem
//! beyond the single file they were handed.

use std::path::{Path, PathBuf};

use http::header::{self, HeaderName};
use http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};

use crate::body;
use crate::error::HttpError;
use crate::etag::{self, FileStat};
use crate::fresh::{self, ConditionalOutcome};
use crate::html;
use crate::options::Options;
use crate::path as pathmod;
use crate::range::{self, RangeParse};

/// A file chosen to be served, along with the metadata gathered while
/// resolving it.
pub struct ResolvedFile {
    /// The path that was stat'd and should be opened to serve the body.
    pub path: PathBuf,
    /// Metadata gathered from that same `stat` call.
    pub stat: FileStat,
}

/// The result of resolving a request pathname, before any directory
/// redirect policy (which belongs to [`crate::Mount`], not here) has been
/// applied.
pub enum ResolveOutcome {
    /// The resolved path is a directory. `is_dir_request` reflects whether
    /// the original pathname already ended in `/`.
    Directory { is_dir_request: bool },
    /// A servable file was found.
    Found(ResolvedFile),
    /// Resolution failed outright (bad input, dotfile policy, ENOENT, I/O).
    Error(HttpError),
}

/// POSIX errno values this crate treats as "not found" for stat/open calls,
/// matching the spec's `ENAMETOOLONG|ENOENT|ENOTDIR → 404` mapping. Linux
/// and macOS agree on these numbers; `ErrorKind::NotFound` alone already
/// covers the portable case.
fn is_missing_like(err: &std::io::Error) -> bool {
    matches!(err.kind(), std::io::ErrorKind::NotFound)
        || matches!(err.raw_os_error(), Some(20) | Some(36))
}

fn with_extension_suffix(path: &Path, ext: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}

/// Guess a `Content-Type` value for `path`, pairing text-ish mime types with
/// `; charset=utf-8` the way the npm `mime` package's charset lookup table
/// does for the types it knows are text.
fn guess_content_type(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let subtype = mime.subtype();
    let needs_charset = mime.type_() == "text" || subtype == "javascript" || subtype == "json" || subtype == "xml";
    if needs_charset {
        format!("{}; charset=utf-8", mime)
    } else {
        mime.to_string()
    }
}

/// Resolve a raw request pathname to a file, applying path sanitation,
/// dotfile policy, and the index/extension probing rules of spec §4.1.
pub async fn resolve(options: &Options, raw_pathname: &str) -> ResolveOutcome {
    let resolved = match pathmod::resolve_path(options.root.as_deref(), raw_pathname) {
        Ok(resolved) => resolved,
        Err(err) => return ResolveOutcome::Error(err),
    };

    if let Err(err) = pathmod::check_dotfiles(&resolved.components, options.dotfiles) {
        return ResolveOutcome::Error(err);
    }

    if resolved.is_dir_request && !options.index.is_empty() {
        for name in &options.index {
            let candidate = resolved.full_path.join(name);
            match tokio::fs::metadata(&candidate).await {
                Ok(meta) if !meta.is_dir() => {
                    return ResolveOutcome::Found(ResolvedFile {
                        path: candidate,
                        stat: FileStat::from_metadata(&meta),
                    });
                }
                Ok(_) => continue,
                Err(err) if is_missing_like(&err) => continue,
                Err(err) => return ResolveOutcome::Error(err.into()),
            }
        }
        return ResolveOutcome::Error(HttpError::not_found());
    }

    match tokio::fs::metadata(&resolved.full_path).await {
        Ok(meta) if meta.is_dir() => ResolveOutcome::Directory {
            is_dir_request: resolved.is_dir_request,
        },
        Ok(meta) => ResolveOutcome::Found(ResolvedFile {
            path: resolved.full_path,
            stat: FileStat::from_metadata(&meta),
        }),
        Err(err) if is_missing_like(&err) => {
            let eligible_for_extensions =
                !resolved.is_dir_request && resolved.full_path.extension().is_none();
            if eligible_for_extensions {
                for ext in &options.extensions {
                    let candidate = with_extension_suffix(&resolved.full_path, ext);
                    match tokio::fs::metadata(&candidate).await {
                        Ok(meta) if !meta.is_dir() => {
                            return ResolveOutcome::Found(ResolvedFile {
                                path: candidate,
                                stat: FileStat::from_metadata(&meta),
                            });
                        }
                        Ok(_) => continue,
                        Err(err) if is_missing_like(&err) => continue,
                        Err(err) => return ResolveOutcome::Error(err.into()),
                    }
                }
            }
            ResolveOutcome::Error(HttpError::not_found())
        }
        Err(err) => ResolveOutcome::Error(err.into()),
    }
}

/// Render the canonical HTML error page for `err`, clearing any notion of
/// previously-set headers first (spec §6: "all previously-set response
/// headers are cleared first, then any headers attached to the error are
/// applied").
pub fn render_error(method: &Method, err: &HttpError) -> Response<hyper::Body> {
    let page = html::error_page(err.status, &err.message);
    let mut builder = Response::builder().status(err.status);
    {
        let headers = builder.headers_mut().expect("status already validated");
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=UTF-8"));
        headers.insert(
            HeaderName::from_static("content-security-policy"),
            HeaderValue::from_static("default-src 'self'"),
        );
        headers.insert(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        );
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_str(&page.len().to_string()).unwrap());
        err.apply_extra_headers(headers);
    }
    let body = if *method == Method::HEAD {
        hyper::Body::empty()
    } else {
        hyper::Body::from(page)
    };
    builder.body(body).expect("error response is well-formed")
}

/// Compose and serve a single already-resolved file: headers, conditional
/// GET, range handling, and (for non-`HEAD` requests) the bounded byte
/// stream. Implements spec §4.1.3.
///
/// An `Err` here only ever represents a failure discovered *after* the file
/// was chosen (an `open`/read race beneath the earlier successful `stat`),
/// which per spec §7 is always forwarded rather than finalized — callers
/// that need that distinction (i.e. [`crate::Mount`]) should match on it
/// directly instead of going through [`build_response`].
pub async fn serve_file(
    options: &Options,
    method: &Method,
    request_headers: &HeaderMap,
    file: ResolvedFile,
) -> Result<Response<hyper::Body>, HttpError> {
    let ResolvedFile { path, stat } = file;
    let size = stat.size;
    let mtime = stat.mtime;

    let window_start = options.start.min(size);
    let mut window_len = size.saturating_sub(window_start);
    if let Some(end) = options.end {
        let capped = end.saturating_sub(window_start).saturating_add(1);
        window_len = window_len.min(capped);
    }

    let etag_value = if options.etag {
        Some(etag::etag(size, mtime))
    } else {
        None
    };

    let mut headers = HeaderMap::new();
    if options.accept_ranges {
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    }
    if options.cache_control {
        let secs = options.max_age_ms / 1000;
        let value = if options.immutable && options.max_age_ms > 0 {
            format!("public, max-age={}, immutable", secs)
        } else {
            format!("public, max-age={}", secs)
        };
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_str(&value).unwrap());
    }
    if options.last_modified {
        headers.insert(
            header::LAST_MODIFIED,
            HeaderValue::from_str(&etag::http_date(mtime)).unwrap(),
        );
    }
    if let Some(tag) = &etag_value {
        headers.insert(header::ETAG, HeaderValue::from_str(tag).unwrap());
    }
    let content_type = guess_content_type(&path);
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(&content_type).unwrap());

    if let Some(hook) = &options.set_headers {
        hook(&mut headers, &path, &stat);
    }

    match fresh::evaluate_conditional(request_headers, etag_value.as_deref(), Some(mtime)) {
        ConditionalOutcome::PreconditionFailed => return Err(HttpError::precondition_failed()),
        ConditionalOutcome::NotModified => {
            // Spec §6/§4.1.3: a 304 carries no representation, so every
            // `Content-*` header describing one is dropped except
            // `Content-Location`, which this crate never sets.
            let mut not_modified_headers = headers.clone();
            not_modified_headers.remove(header::CONTENT_TYPE);
            not_modified_headers.remove(header::CONTENT_LENGTH);
            not_modified_headers.remove(header::CONTENT_RANGE);
            let mut builder = Response::builder().status(StatusCode::NOT_MODIFIED);
            *builder.headers_mut().expect("status already validated") = not_modified_headers;
            return Ok(builder.body(hyper::Body::empty()).expect("304 response is well-formed"));
        }
        ConditionalOutcome::Proceed => {}
    }

    let mut status = StatusCode::OK;
    let mut body_offset = window_start;
    let mut body_len = window_len;

    if options.accept_ranges {
        if let Some(range_value) = fresh::header_str(request_headers, header::RANGE) {
            let honor_range = match fresh::header_str(request_headers, header::IF_RANGE) {
                Some(if_range) => range::if_range_fresh(if_range, etag_value.as_deref(), Some(mtime)),
                None => true,
            };
            if honor_range {
                match range::parse_range(window_len, range_value, true) {
                    RangeParse::Malformed => {}
                    RangeParse::Unsatisfiable => return Err(HttpError::range_not_satisfiable(window_len)),
                    RangeParse::Satisfiable(ranges) if ranges.len() == 1 => {
                        let r = ranges[0];
                        let value = format!("bytes {}-{}/{}", r.start, r.end, window_len);
                        headers.insert(header::CONTENT_RANGE, HeaderValue::from_str(&value).unwrap());
                        body_offset = window_start + r.start;
                        body_len = r.len();
                        status = StatusCode::PARTIAL_CONTENT;
                    }
                    // Multiple combined ranges: fall back to a full 200 body.
                    RangeParse::Satisfiable(_) => {}
                }
            }
        }
    }

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from_str(&body_len.to_string()).unwrap());

    let mut builder = Response::builder().status(status);
    *builder.headers_mut().expect("status already validated") = headers;

    if *method == Method::HEAD {
        return Ok(builder.body(hyper::Body::empty()).expect("HEAD response is well-formed"));
    }

    let streamed = body::open_windowed(&path, body_offset, body_len).await?;
    Ok(builder.body(streamed).expect("file response is well-formed"))
}

/// Resolve `decision` (already past any directory policy) into a complete
/// response, rendering the canonical error page for any `Err`. Used by
/// [`crate::Responder::run`]; [`crate::Mount`] calls [`serve_file`] directly
/// instead so it can apply its own fallthrough policy to post-file errors.
pub async fn build_response(
    options: &Options,
    method: &Method,
    request_headers: &HeaderMap,
    decision: Result<ResolvedFile, HttpError>,
) -> Response<hyper::Body> {
    match decision {
        Ok(file) => match serve_file(options, method, request_headers, file).await {
            Ok(response) => response,
            Err(err) => render_error(method, &err),
        },
        Err(err) => render_error(method, &err),
    }
}

/// A standalone, framework-mountable responder: resolves one request
/// against `options` and always produces a response. Directory requests
/// resolve to `404` (the redirect-vs-404 policy choice is
/// [`crate::Mount`]-only); every error renders the canonical HTML page.
pub struct Responder {
    options: Options,
}

impl Responder {
    /// Build a `Responder` over `options`. `options.root`, if set, sandboxes
    /// every request; if unset, pathnames resolve to absolute filesystem
    /// paths directly.
    pub fn new(options: Options) -> Self {
        Responder { options }
    }

    /// The options this responder was built with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Resolve and serve `req`, returning a complete response.
    pub async fn run<B>(&self, req: &Request<B>) -> Response<hyper::Body> {
        let decision = match resolve(&self.options, req.uri().path()).await {
            ResolveOutcome::Found(file) => Ok(file),
            ResolveOutcome::Directory { .. } => Err(HttpError::not_found()),
            ResolveOutcome::Error(err) => Err(err),
        };
        build_response(&self.options, req.method(), req.headers(), decision).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_rooted_at(dir: &Path) -> Options {
        let mut options = Options::new();
        options.root(dir);
        options
    }

    async fn resolved_file(options: &Options, pathname: &str) -> ResolvedFile {
        match resolve(options, pathname).await {
            ResolveOutcome::Found(file) => file,
            ResolveOutcome::Directory { .. } => panic!("expected Found, got Directory"),
            ResolveOutcome::Error(err) => panic!("expected Found, got Error({})", err),
        }
    }

    #[tokio::test]
    async fn precondition_failure_returns_412() {
        let dir = tempdir::TempDir::new("responder-test").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello\n").unwrap();
        let options = options_rooted_at(dir.path());
        let file = resolved_file(&options, "/a.txt").await;

        let mut headers = HeaderMap::new();
        headers.insert(header::IF_MATCH, HeaderValue::from_static("\"not-the-etag\""));

        let err = serve_file(&options, &Method::GET, &headers, file).await.unwrap_err();
        assert_eq!(err.status, StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn non_adjacent_multi_range_falls_back_to_full_200() {
        let dir = tempdir::TempDir::new("responder-test").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"0123456789").unwrap();
        let options = options_rooted_at(dir.path());
        let file = resolved_file(&options, "/a.txt").await;

        let mut headers = HeaderMap::new();
        headers.insert(header::RANGE, HeaderValue::from_static("bytes=0-1,5-6"));

        let response = serve_file(&options, &Method::GET, &headers, file).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_RANGE).is_none());
        assert_eq!(response.headers().get(header::CONTENT_LENGTH).unwrap(), "10");

        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&bytes[..], b"0123456789");
    }

    #[tokio::test]
    async fn extension_fallback_serves_configured_extension() {
        let dir = tempdir::TempDir::new("responder-test").unwrap();
        std::fs::write(dir.path().join("missing.html"), b"hello").unwrap();
        let mut options = options_rooted_at(dir.path());
        options.extensions(["html"]);

        match resolve(&options, "/missing").await {
            ResolveOutcome::Found(file) => {
                assert_eq!(file.path, dir.path().join("missing.html"));
                assert_eq!(file.stat.size, 5);
            }
            ResolveOutcome::Directory { .. } => panic!("expected Found via extension fallback, got Directory"),
            ResolveOutcome::Error(err) => panic!("expected Found via extension fallback, got Error({})", err),
        }
    }
}
