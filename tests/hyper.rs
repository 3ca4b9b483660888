use hyper::service::make_service_fn;
use static_respond::{Mount, Options};

// Demonstrates that a `Mount` can be used as a hyper service directly,
// matching the dual struct-and-Service role the spec calls for.
#[tokio::test]
async fn test_usable_as_hyper_service() {
    let dir = tempdir::TempDir::new("static-respond-hyper-test").unwrap();
    let mount = Mount::new(dir.path(), Options::new()).unwrap();

    let make_service = make_service_fn(|_| {
        let mount = mount.clone();
        async move { Ok::<_, std::convert::Infallible>(mount) }
    });

    // Bind to port "0" to allow the OS to pick one that's free, avoiding
    // the risk of collisions.
    let addr = ([127, 0, 0, 1], 0).into();
    let server = hyper::server::Server::bind(&addr).serve(make_service);

    // It's enough to show that this builds and type-checks; no need to
    // actually accept a connection.
    drop(server);
}
