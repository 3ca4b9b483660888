use http::{HeaderMap, HeaderValue, StatusCode};

/// A fully-classified failure of the request-to-response state machine.
///
/// Every error carries the status code it should produce, a short message
/// for the HTML error body, and any extra headers the status requires
/// (`Content-Range` on 416, `Allow` on 405).
///
/// Whether an error is finalized into a response here or deferred to a
/// caller is a [`Mount`](crate::Mount)-level policy decision; see
/// [`HttpError::should_defer`].
#[derive(Debug, thiserror::Error)]
#[error("{status}: {message}")]
pub struct HttpError {
    /// The status code this error should produce.
    pub status: StatusCode,
    /// A short message, shown verbatim (escaped) in the HTML error body.
    pub message: String,
    pub(crate) extra_headers: Vec<(http::header::HeaderName, HeaderValue)>,
}

impl HttpError {
    pub(crate) fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HttpError {
            status,
            message: message.into(),
            extra_headers: Vec::new(),
        }
    }

    pub(crate) fn with_header(mut self, name: http::header::HeaderName, value: HeaderValue) -> Self {
        self.extra_headers.push((name, value));
        self
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub(crate) fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found")
    }

    pub(crate) fn precondition_failed() -> Self {
        Self::new(StatusCode::PRECONDITION_FAILED, "Precondition Failed")
    }

    pub(crate) fn range_not_satisfiable(total: u64) -> Self {
        let value = HeaderValue::from_str(&format!("bytes */{}", total))
            .unwrap_or_else(|_| HeaderValue::from_static("bytes */0"));
        Self::new(StatusCode::RANGE_NOT_SATISFIABLE, "Range Not Satisfiable")
            .with_header(http::header::CONTENT_RANGE, value)
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Whether a [`Mount`](crate::Mount) should hand this error back to its
    /// caller (`true`) rather than finalizing an HTML error response itself
    /// (`false`).
    ///
    /// Once a file has been chosen for serving, every subsequent error is
    /// always handed back (the "file" event has already fired) — that's
    /// `file_chosen`. A `5xx` is always handed back too. Otherwise it
    /// follows the `fallthrough` option: a `Mount` only renders its own
    /// error page when `fallthrough` is disabled.
    pub fn should_defer(&self, file_chosen: bool, fallthrough_enabled: bool) -> bool {
        file_chosen || self.status.as_u16() >= 500 || fallthrough_enabled
    }

    /// Build the extra headers this error requires (e.g. `Content-Range`,
    /// `Allow`) into the given header map.
    pub fn apply_extra_headers(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.extra_headers {
            headers.insert(name.clone(), value.clone());
        }
    }
}

impl From<std::io::Error> for HttpError {
    /// Maps unexpected I/O errors to `500`. Expected I/O errors (not found,
    /// permission denied, etc.) are mapped explicitly at their call sites
    /// instead of going through this impl.
    fn from(err: std::io::Error) -> Self {
        tracing::error!(error = %err, "unexpected I/O error");
        HttpError::internal(err.to_string())
    }
}
