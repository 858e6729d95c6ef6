use std::sync::Mutex;

use http::StatusCode;
use rustls::{ClientConfig, RootCertStore};

use crate::digitalocean::{Droplet, Links, NetworkV4, Networks, Pages, Region};
use crate::http::HttpClient;
use crate::inventory::{FetchError, Inventory, ListOptions, Page};

/// No roots needed, the mock servers speak plain HTTP.
pub fn plain_client() -> HttpClient {
    let tls = ClientConfig::builder()
        .with_root_certificates(RootCertStore::empty())
        .with_no_client_auth();

    HttpClient::new_with_tls_config(tls)
}

/// A running droplet with both a public and a private address.
pub fn droplet(id: u64) -> Droplet {
    Droplet {
        id,
        name: format!("droplet-{id}"),
        status: "active".to_string(),
        tags: vec!["test".to_string()],
        region: Region {
            slug: "ams3".to_string(),
            name: "Amsterdam 3".to_string(),
        },
        size_slug: "s-1vcpu-1gb".to_string(),
        networks: Networks {
            v4: vec![
                NetworkV4 {
                    ip_address: format!("203.0.113.{}", id % 256),
                    kind: "public".to_string(),
                    ..Default::default()
                },
                NetworkV4 {
                    ip_address: format!("10.0.0.{}", id % 256),
                    kind: "private".to_string(),
                    ..Default::default()
                },
            ],
            v6: vec![],
        },
    }
}

pub fn more_pages(droplets: Vec<Droplet>) -> Page {
    Page {
        droplets,
        links: Some(Links {
            pages: Some(Pages {
                last: Some("https://api.digitalocean.com/v2/droplets?page=99".to_string()),
                ..Default::default()
            }),
        }),
        total: None,
    }
}

pub fn last_page(droplets: Vec<Droplet>) -> Page {
    Page {
        droplets,
        links: Some(Links {
            pages: Some(Pages {
                first: Some("https://api.digitalocean.com/v2/droplets?page=1".to_string()),
                ..Default::default()
            }),
        }),
        total: None,
    }
}

/// Serves pre-built pages, and records every request.
pub struct StaticInventory {
    pages: Vec<Page>,
    fail_at: Option<u32>,
    hang_at: Option<u32>,
    requested: Mutex<Vec<ListOptions>>,
}

impl StaticInventory {
    pub fn new(pages: Vec<Page>) -> Self {
        StaticInventory {
            pages,
            fail_at: None,
            hang_at: None,
            requested: Mutex::new(vec![]),
        }
    }

    /// Respond 500 to the given page.
    pub fn fail_at(mut self, page: u32) -> Self {
        self.fail_at = Some(page);
        self
    }

    /// Never respond to the given page.
    pub fn hang_at(mut self, page: u32) -> Self {
        self.hang_at = Some(page);
        self
    }

    pub fn requested(&self) -> Vec<ListOptions> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Inventory for StaticInventory {
    async fn list(&self, opts: &ListOptions) -> Result<Page, FetchError> {
        self.requested.lock().unwrap().push(*opts);

        if self.hang_at == Some(opts.page) {
            std::future::pending::<()>().await;
        }

        if self.fail_at == Some(opts.page) {
            return Err(FetchError::UnexpectedStatus {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Internal Server Error".to_string(),
            });
        }

        let index = opts.page as usize - 1;
        Ok(self.pages.get(index).cloned().unwrap_or_default())
    }
}
