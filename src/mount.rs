//! [`Mount`]: a [`hyper::service::Service`] that serves a directory tree,
//! owning the directory-redirect-vs-404 policy and fallthrough
//! classification the bare [`crate::Responder`] doesn't. Mirrors the dual
//! role the teacher crate's `Static` plays (a plain struct that is also a
//! `Service`).

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::{header, Method, Request, Response, StatusCode};

use crate::error::HttpError;
use crate::html;
use crate::options::Options;
use crate::path as pathmod;
use crate::responder::{self, ResolveOutcome};

/// Serves the directory tree rooted at `options.root` (set by [`Mount::new`]
/// regardless of any root already present in `options`) as a
/// `hyper::service::Service`.
#[derive(Clone)]
pub struct Mount {
    options: Options,
}

impl Mount {
    /// Build a `Mount` rooted at `root`. `root` must be non-empty and must
    /// exist (it's canonicalized at construction, a synchronous
    /// "programmer error" check per spec §7, not a per-request cost).
    pub fn new(root: impl AsRef<Path>, mut options: Options) -> std::io::Result<Self> {
        let root = root.as_ref();
        if root.as_os_str().is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "mount root must not be empty",
            ));
        }
        let canonical = std::fs::canonicalize(root)?;
        options.root(canonical);
        Ok(Mount { options })
    }

    /// The options this mount was built with, including the canonicalized
    /// root `Mount::new` installed.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Resolve and serve one request. `Ok` is a complete response; `Err` is
    /// a deferral (fallthrough-eligible pre-file error, non-matching
    /// method) or a forced forward (post-file error, or status ≥ 500) —
    /// either way, the caller decides what to do next.
    pub async fn handle(
        options: &Options,
        req: &Request<hyper::Body>,
    ) -> Result<Response<hyper::Body>, HttpError> {
        let method = req.method().clone();

        if method != Method::GET && method != Method::HEAD {
            return if options.fallthrough {
                tracing::debug!(%method, "deferring non-GET/HEAD request");
                Err(HttpError::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"))
            } else {
                Ok(method_not_allowed_response())
            };
        }

        let original_path = req.uri().path().to_owned();
        let outcome = responder::resolve(options, &original_path).await;

        let decision = match outcome {
            ResolveOutcome::Found(file) => Ok(file),
            ResolveOutcome::Directory { is_dir_request } => {
                if is_dir_request {
                    tracing::debug!(path = %original_path, "directory request with no usable index");
                    Err(HttpError::not_found())
                } else if options.redirect {
                    let collapsed = pathmod::collapse_leading_slashes(&original_path);
                    let location = pathmod::encode_url(&format!("{}/", collapsed));
                    tracing::debug!(location = %location, "redirecting bare directory request");
                    return Ok(redirect_response(&location));
                } else {
                    Err(HttpError::not_found())
                }
            }
            ResolveOutcome::Error(err) => Err(err),
        };

        match decision {
            Ok(file) => responder::serve_file(options, &method, req.headers(), file)
                .await
                .map_err(|err| {
                    tracing::error!(error = %err, "error after file was chosen; forwarding");
                    err
                }),
            Err(err) => {
                if err.should_defer(false, options.fallthrough) {
                    Err(err)
                } else {
                    Ok(responder::render_error(&method, &err))
                }
            }
        }
    }
}

fn method_not_allowed_response() -> Response<hyper::Body> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(header::ALLOW, "GET, HEAD")
        .header(header::CONTENT_LENGTH, "0")
        .body(hyper::Body::empty())
        .expect("405 response is well-formed")
}

fn redirect_response(location: &str) -> Response<hyper::Body> {
    let page = html::redirect_page(location);
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(header::LOCATION, location)
        .header(header::CONTENT_TYPE, "text/html; charset=UTF-8")
        .header("content-security-policy", "default-src 'self'")
        .header("x-content-type-options", "nosniff")
        .header(header::CONTENT_LENGTH, page.len().to_string())
        .body(hyper::Body::from(page))
        .expect("redirect response is well-formed")
}

impl hyper::service::Service<Request<hyper::Body>> for Mount {
    type Response = Response<hyper::Body>;
    type Error = HttpError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<hyper::Body>) -> Self::Future {
        let options = self.options.clone();
        Box::pin(async move { Mount::handle(&options, &req).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_not_allowed_has_zero_length_body() {
        let response = method_not_allowed_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::CONTENT_LENGTH).unwrap(), "0");
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET, HEAD");
    }

    #[test]
    fn redirect_response_has_location_and_body() {
        let response = redirect_response("/mnt/sub/");
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/mnt/sub/");
    }
}
