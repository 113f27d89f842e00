use std::io;

/// Binds an ephemeral localhost port for an in-process fake upstream.
///
/// `None` when the sandbox refuses loopback sockets; the caller skips its test.
pub async fn bind_local_upstream() -> Option<tokio::net::TcpListener> {
    loopback_allowed(tokio::net::TcpListener::bind(("127.0.0.1", 0)).await)
}

/// Same check for tests whose upstream is started by `httpmock`.
pub fn should_skip_local_upstream() -> bool {
    loopback_allowed(std::net::TcpListener::bind(("127.0.0.1", 0))).is_none()
}

fn loopback_allowed<L>(bound: io::Result<L>) -> Option<L> {
    match bound {
        Ok(listener) => Some(listener),
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
            eprintln!("loopback bind denied, skipping upstream test");
            None
        }
        Err(err) => panic!("cannot bind 127.0.0.1 for a fake upstream: {err}"),
    }
}
