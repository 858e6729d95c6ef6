use bytes::Bytes;
use http::header::{ACCEPT_ENCODING, HeaderValue, USER_AGENT};
use http::{Request, Response};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper_rustls::{ConfigBuilderExt, HttpsConnector};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use rustls::ClientConfig;
use thiserror::Error;
use tracing::Instrument;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to load native root certificates: {0}")]
    NativeCerts(std::io::Error),
    #[error("failed to make HTTP(S) request: {0}")]
    CallRequest(#[from] hyper_util::client::legacy::Error),
    #[error("failed to read response: {0}")]
    ReadIncoming(#[from] hyper::Error),
    #[error("failed to build HTTP request: {0}")]
    BuildRequest(#[from] http::Error),
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    user_agent: HeaderValue,
}

impl HttpClient {
    /// Build a client trusting the platform's native root certificates.
    pub fn new() -> Result<HttpClient, HttpError> {
        let config = ClientConfig::builder()
            .with_native_roots()
            .map_err(HttpError::NativeCerts)?
            .with_no_client_auth();

        Ok(HttpClient::new_with_tls_config(config))
    }

    /// Build a client with a custom TLS config. Plain `http://` endpoints
    /// are allowed as well.
    pub fn new_with_tls_config(tls: ClientConfig) -> HttpClient {
        let mut http = HttpConnector::new();
        http.enforce_http(false);

        let https = HttpsConnector::from((http, tls));
        let client = Client::builder(TokioExecutor::new()).build(https);
        let user_agent = HeaderValue::from_static(concat!(
            "digitalocean-sd/",
            env!("CARGO_PKG_VERSION")
        ));

        HttpClient { client, user_agent }
    }

    pub async fn send(&self, mut req: Request<Full<Bytes>>) -> Result<Response<Incoming>, HttpError> {
        let span = info_span!("http", method = %req.method(), uri = %req.uri());

        default_request_headers(&mut req, &self.user_agent);

        let resp = self.client.request(req);
        async move {
            // Capture the time right before we issue the request.
            let before = std::time::Instant::now();

            let resp = resp.await.inspect_err(|err| {
                debug!(message = "HTTP error", %err);
            })?;

            debug!(
                message = "HTTP response",
                status = %resp.status(),
                elapsed = ?before.elapsed(),
            );

            Ok::<_, HttpError>(resp)
        }
        .instrument(span)
        .await
    }
}

fn default_request_headers<B>(req: &mut Request<B>, user_agent: &HeaderValue) {
    if !req.headers().contains_key(USER_AGENT) {
        req.headers_mut().insert(USER_AGENT, user_agent.clone());
    }

    if !req.headers().contains_key(ACCEPT_ENCODING) {
        // no compression support
        req.headers_mut()
            .insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    }
}
