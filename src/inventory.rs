use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

use crate::digitalocean::{Droplet, Links};
use crate::http::HttpError;

/// Pages worth of droplets reserved up front at most.
const RESERVE_PAGES: u64 = 16;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("unexpected status code {status}, {message}")]
    UnexpectedStatus { status: StatusCode, message: String },

    #[error("decode droplets response failed, {0}")]
    Decode(#[from] serde_json::Error),

    #[error("fetch page {page} timed out after {timeout:?}")]
    Timeout { page: u32, timeout: Duration },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListOptions {
    /// Pages are counted from 1
    pub page: u32,

    pub per_page: u32,
}

/// One page of the droplets listing.
#[derive(Clone, Debug, Default)]
pub struct Page {
    pub droplets: Vec<Droplet>,

    /// Pagination links, the API leaves them out when everything fits in
    /// one page.
    pub links: Option<Links>,

    /// Total number of droplets across all pages, if reported.
    pub total: Option<u64>,
}

impl Page {
    pub fn is_last(&self) -> bool {
        self.links.as_ref().is_none_or(Links::is_last_page)
    }
}

/// Inventory is a paginated source of droplets.
#[async_trait::async_trait]
pub trait Inventory: Send + Sync {
    async fn list(&self, opts: &ListOptions) -> Result<Page, FetchError>;
}

/// Walk all pages of the inventory, starting from page 1, until the last
/// page is reached. Any failed page fails the whole listing, nothing
/// gathered before is returned.
pub async fn fetch_all<I>(
    inventory: &I,
    per_page: u32,
    timeout: Option<Duration>,
) -> Result<Vec<Droplet>, FetchError>
where
    I: Inventory + ?Sized,
{
    let mut opts = ListOptions { page: 1, per_page };
    let mut droplets = Vec::new();

    loop {
        let page = match timeout {
            Some(timeout) => tokio::time::timeout(timeout, inventory.list(&opts))
                .await
                .map_err(|_elapsed| FetchError::Timeout {
                    page: opts.page,
                    timeout,
                })??,
            None => inventory.list(&opts).await?,
        };

        // the reported total is only a hint, the allocation is capped
        if let Some(total) = page.total.filter(|_| opts.page == 1) {
            let hint = total.min(u64::from(per_page) * RESERVE_PAGES);
            droplets.reserve(usize::try_from(hint).unwrap_or_default());
        }

        debug!(
            message = "fetched droplets page",
            page = opts.page,
            droplets = page.droplets.len(),
        );

        let last = page.is_last();
        droplets.extend(page.droplets);
        if last {
            break;
        }

        opts.page += 1;
    }

    Ok(droplets)
}
