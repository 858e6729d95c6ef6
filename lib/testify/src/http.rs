use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

/// HTTP status code 404
pub fn not_found() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(Full::new(Bytes::from_static(b"Not Found")))
        .unwrap()
}

/// Response with `Content-Type: application/json`
pub fn json(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(body.into()))
        .unwrap()
}

/// Bind a HTTP/1 server on a random local port and serve every connection
/// with `handle`. The listener is bound before this function returns, so
/// requests can be sent right away.
pub async fn serve<F, Fut>(handle: F) -> SocketAddr
where
    F: Fn(Request<Incoming>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<Full<Bytes>>, Infallible>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let (conn, _peer) = match listener.accept().await {
                Ok(pair) => pair,
                Err(err) => panic!("accept connection failed: {err}"),
            };

            let handle = handle.clone();
            tokio::spawn(async move {
                // clients may hang up early, e.g. when a request timed out
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(conn), service_fn(handle))
                    .await;
            });
        }
    });

    addr
}
