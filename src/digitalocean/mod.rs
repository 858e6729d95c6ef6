//! A tiny client of the DigitalOcean API, only the droplets listing is
//! implemented.

mod droplet;

use bytes::Bytes;
use headers::authorization::Bearer;
use headers::{Authorization, HeaderMapExt};
use http::header::ACCEPT;
use http::{HeaderMap, Request, Uri};
use http_body_util::{BodyExt, Full};
use serde::Deserialize;

pub use droplet::{Droplet, NetworkV4, NetworkV6, Networks, Region};

use crate::config::{ConfigError, SecretString};
use crate::http::{HttpClient, HttpError};
use crate::inventory::{FetchError, Inventory, ListOptions, Page};

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Links {
    #[serde(default)]
    pub pages: Option<Pages>,
}

impl Links {
    /// The API only sends `last` when there are pages after the current
    /// one.
    pub fn is_last_page(&self) -> bool {
        match &self.pages {
            Some(pages) => pages.last.as_deref().is_none_or(str::is_empty),
            None => true,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Pages {
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub last: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct DropletsResponse {
    #[serde(default)]
    droplets: Vec<Droplet>,
    #[serde(default)]
    links: Option<Links>,
    #[serde(default)]
    meta: Option<Meta>,
}

/// Error body of a failed request, e.g.
/// `{"id": "unauthorized", "message": "Unable to authenticate you"}`
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    id: String,
    message: String,
}

pub struct Client {
    http: HttpClient,
    endpoint: String,
    authorization: Authorization<Bearer>,
}

impl Client {
    pub fn new(http: HttpClient, endpoint: &Uri, token: &SecretString) -> Result<Self, ConfigError> {
        let authorization = Authorization::bearer(token).map_err(|_| ConfigError::InvalidToken)?;
        let endpoint = endpoint.to_string().trim_end_matches('/').to_string();

        Ok(Client {
            http,
            endpoint,
            authorization,
        })
    }

    fn droplets_uri(&self, opts: &ListOptions) -> String {
        format!(
            "{}/v2/droplets?page={}&per_page={}",
            self.endpoint, opts.page, opts.per_page
        )
    }
}

#[async_trait::async_trait]
impl Inventory for Client {
    async fn list(&self, opts: &ListOptions) -> Result<Page, FetchError> {
        let mut req = Request::get(self.droplets_uri(opts))
            .header(ACCEPT, "application/json")
            .body(Full::<Bytes>::default())
            .map_err(HttpError::from)?;
        req.headers_mut().typed_insert(self.authorization.clone());

        let resp = self.http.send(req).await?;
        let (parts, incoming) = resp.into_parts();
        let body = incoming
            .collect()
            .await
            .map_err(HttpError::from)?
            .to_bytes();

        log_rate_limit(&parts.headers);

        if !parts.status.is_success() {
            let message = match serde_json::from_slice::<ApiError>(&body) {
                Ok(err) if err.id.is_empty() => err.message,
                Ok(err) => format!("{}: {}", err.id, err.message),
                Err(_) => parts
                    .status
                    .canonical_reason()
                    .unwrap_or("unknown")
                    .to_string(),
            };

            return Err(FetchError::UnexpectedStatus {
                status: parts.status,
                message,
            });
        }

        let resp: DropletsResponse = serde_json::from_slice(&body)?;

        Ok(Page {
            droplets: resp.droplets,
            links: resp.links,
            total: resp.meta.map(|meta| meta.total),
        })
    }
}

fn log_rate_limit(headers: &HeaderMap) {
    let remaining = headers
        .get("ratelimit-remaining")
        .and_then(|value| value.to_str().ok());

    if let Some(remaining) = remaining {
        debug!(message = "api rate limit", remaining);
    }
}
