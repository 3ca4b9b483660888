use std::path::PathBuf;
use std::sync::Arc;

use crate::etag::FileStat;

/// One year in milliseconds, the ceiling `Options::max_age` is clamped to.
const MAX_MAX_AGE_MS: u64 = 31_536_000_000;

/// Dotfile handling policy.
///
/// A "dotfile component" is any path segment longer than one character that
/// starts with `.` (so `.` and `..` themselves don't count — those are
/// handled by path normalization before this policy ever sees them).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dotfiles {
    /// Serve dotfiles like any other file.
    Allow,
    /// Reject requests that touch a dotfile component with `403 Forbidden`.
    Deny,
    /// Reject requests that touch a dotfile component with `404 Not Found`,
    /// checking every path component.
    Ignore,
    /// Like `Ignore`, but only the first path component is checked. Files
    /// nested inside a dot-prefixed directory remain reachable. This is the
    /// default, kept for backward compatibility with older deployments.
    Legacy,
}

impl Default for Dotfiles {
    fn default() -> Self {
        Dotfiles::Legacy
    }
}

/// Hook invoked synchronously while headers are being composed, before any
/// conditional-GET or range logic runs. Must not block or suspend.
pub type SetHeaders = Arc<dyn Fn(&mut http::HeaderMap, &std::path::Path, &FileStat) + Send + Sync>;

/// Configuration shared by [`crate::Responder`] and [`crate::Mount`].
///
/// Constructed with the builder pattern; every setter takes and returns
/// `&mut Self` so calls can be chained.
#[derive(Clone)]
pub struct Options {
    pub(crate) accept_ranges: bool,
    pub(crate) cache_control: bool,
    pub(crate) etag: bool,
    pub(crate) last_modified: bool,
    pub(crate) max_age_ms: u64,
    pub(crate) dotfiles: Dotfiles,
    pub(crate) extensions: Vec<String>,
    pub(crate) index: Vec<String>,
    pub(crate) root: Option<PathBuf>,
    pub(crate) redirect: bool,
    pub(crate) fallthrough: bool,
    pub(crate) immutable: bool,
    pub(crate) set_headers: Option<SetHeaders>,
    pub(crate) start: u64,
    pub(crate) end: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            accept_ranges: true,
            cache_control: true,
            etag: true,
            last_modified: true,
            max_age_ms: 0,
            dotfiles: Dotfiles::Legacy,
            extensions: Vec::new(),
            index: vec!["index.html".to_owned()],
            root: None,
            redirect: true,
            fallthrough: true,
            immutable: false,
            set_headers: None,
            start: 0,
            end: None,
        }
    }
}

impl Options {
    /// Create an `Options` with every default value (see module docs for
    /// each field's default).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sandbox root. When set, every resolved path is guaranteed to
    /// be a lexical descendant of it.
    pub fn root(&mut self, root: impl Into<PathBuf>) -> &mut Self {
        self.root = Some(root.into());
        self
    }

    /// Advertise and honor `Range` requests. Default `true`.
    pub fn accept_ranges(&mut self, value: bool) -> &mut Self {
        self.accept_ranges = value;
        self
    }

    /// Emit `Cache-Control`. Default `true`.
    pub fn cache_control(&mut self, value: bool) -> &mut Self {
        self.cache_control = value;
        self
    }

    /// Emit `ETag`. Default `true`.
    pub fn etag(&mut self, value: bool) -> &mut Self {
        self.etag = value;
        self
    }

    /// Emit `Last-Modified`. Default `true`.
    pub fn last_modified(&mut self, value: bool) -> &mut Self {
        self.last_modified = value;
        self
    }

    /// Set `max-age`, in milliseconds, clamped to `[0, 31_536_000_000]`
    /// (one year). Values outside the range are clamped rather than
    /// rejected.
    pub fn max_age(&mut self, ms: u64) -> &mut Self {
        self.max_age_ms = ms.min(MAX_MAX_AGE_MS);
        self
    }

    /// Set the dotfile handling policy. Default [`Dotfiles::Legacy`].
    pub fn dotfiles(&mut self, value: Dotfiles) -> &mut Self {
        self.dotfiles = value;
        self
    }

    /// Extension fallback list, tried in order as suffixes when the bare
    /// path doesn't exist. Default empty.
    pub fn extensions<I, S>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = values.into_iter().map(Into::into).collect();
        self
    }

    /// Index file candidates, tried in order when the path ends in `/`.
    /// Default `["index.html"]`.
    pub fn index<I, S>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index = values.into_iter().map(Into::into).collect();
        self
    }

    /// Redirect bare directory requests to the same path with a trailing
    /// slash. Mount-only. Default `true`.
    pub fn redirect(&mut self, value: bool) -> &mut Self {
        self.redirect = value;
        self
    }

    /// Defer non-GET/HEAD requests, and errors that occur before a file is
    /// chosen, back to the caller instead of finalizing a response.
    /// Mount-only. Default `true`.
    pub fn fallthrough(&mut self, value: bool) -> &mut Self {
        self.fallthrough = value;
        self
    }

    /// Append `, immutable` to `Cache-Control` whenever `max_age > 0`.
    /// Default `false`.
    pub fn immutable(&mut self, value: bool) -> &mut Self {
        self.immutable = value;
        self
    }

    /// Install a synchronous hook that can add or override response headers
    /// once the file to serve is known, before conditional/range logic runs.
    pub fn set_headers<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut http::HeaderMap, &std::path::Path, &FileStat) + Send + Sync + 'static,
    {
        self.set_headers = Some(Arc::new(hook));
        self
    }

    /// Restrict the effective byte window of the file to
    /// `[start, end.unwrap_or(size - 1)]`, applied before `Range` parsing.
    pub fn byte_window(&mut self, start: u64, end: Option<u64>) -> &mut Self {
        self.start = start;
        self.end = end;
        self
    }
}
