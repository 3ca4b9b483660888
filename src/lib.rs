#![crate_name = "static_respond"]
#![deny(missing_docs)]

//! Static file-serving for [Hyper](https://github.com/hyperium/hyper) 0.14.
//!
//! This library exports a high-level [`Mount`], which is a
//! `hyper::service::Service` that serves a directory tree directly — path
//! sanitation, dotfile policy, conditional GET, byte ranges, and directory
//! redirects all included — and a lower-level [`Responder`] for when you
//! want those same semantics without the directory-redirect policy or
//! fallthrough wiring `Mount` adds on top.
//!
//! ## Basic usage
//!
//! ```no_run
//! use static_respond::{Mount, Options};
//!
//! # async fn run() -> std::io::Result<()> {
//! let mount = Mount::new("my/doc/root", Options::new())?;
//! # let _ = mount;
//! # Ok(())
//! # }
//! ```
//!
//! `Mount` implements `hyper::service::Service<http::Request<hyper::Body>>`,
//! so it drops directly into a `hyper::Server`; see `demos/basic_server.rs`
//! for a complete example.
//!
//! ## Advanced usage
//!
//! `Mount` is itself a thin policy layer over [`resolve`] and
//! [`Responder`]. You can reimplement the same behavior, or override
//! specific outcomes (a custom 404 page, say) by matching on
//! [`ResolveOutcome`] yourself and falling back to [`build_response`] for
//! everything else:
//!
//! ```no_run
//! use static_respond::{build_response, resolve, Options, ResolveOutcome};
//!
//! # async fn run(req: http::Request<()>) {
//! let options = Options::new();
//! let decision = match resolve(&options, req.uri().path()).await {
//!     ResolveOutcome::Found(file) => Ok(file),
//!     ResolveOutcome::Directory { .. } => {
//!         Err(std::io::Error::new(std::io::ErrorKind::NotFound, "directory").into())
//!     }
//!     ResolveOutcome::Error(err) => Err(err),
//! };
//! let _response = build_response(&options, req.method(), req.headers(), decision).await;
//! # }
//! ```

mod body;
mod error;
mod etag;
mod fresh;
mod html;
mod mount;
mod options;
mod path;
mod range;
mod responder;

pub use crate::error::HttpError;
pub use crate::etag::FileStat;
pub use crate::mount::Mount;
pub use crate::options::{Dotfiles, Options};
pub use crate::responder::{build_response, resolve, ResolveOutcome, Responder, ResolvedFile};
