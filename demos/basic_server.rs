// Serves a directory tree over HTTP.
//
// Run `cargo run --example basic_server -- <dir>` (defaults to the current
// directory), then point a browser at http://localhost:3000/

use std::convert::Infallible;
use std::net::SocketAddr;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Request, Response};
use static_respond::{HttpError, Mount, Options};

async fn handle(mount: Mount, req: Request<hyper::Body>) -> Result<Response<hyper::Body>, Infallible> {
    match Mount::handle(mount.options(), &req).await {
        Ok(response) => Ok(response),
        Err(err) => Ok(fallback_response(&err)),
    }
}

// This demo has no further handlers to fall through to, so any deferred
// error (including a plain 405, since `fallthrough` defaults to `true`)
// becomes a last-resort plain-text response.
fn fallback_response(err: &HttpError) -> Response<hyper::Body> {
    Response::builder()
        .status(err.status)
        .body(hyper::Body::from(err.message.clone()))
        .expect("fallback response is well-formed")
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let root = std::env::args().nth(1).unwrap_or_else(|| ".".to_owned());
    let mount = Mount::new(&root, Options::new()).expect("failed to set up mount point");

    let make_service = make_service_fn(move |_| {
        let mount = mount.clone();
        async move { Ok::<_, Infallible>(service_fn(move |req| handle(mount.clone(), req))) }
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let server = hyper::Server::bind(&addr).serve(make_service);
    tracing::info!(%addr, root = %root, "serving");
    if let Err(err) = server.await {
        tracing::error!(error = %err, "server failed");
    }
}
