use std::convert::Infallible;

use crate::config::Config;
use crate::inventory::{Inventory, fetch_all};
use crate::publish::Publisher;
use crate::target::to_targets;
use crate::Result;

/// What a successful cycle did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleReport {
    /// Droplets listed by the inventory
    pub droplets: usize,
    /// Targets written, droplets without networks are not counted
    pub targets: usize,
    /// Size of the written document
    pub bytes: usize,
}

/// Discovery ties the inventory, the mapper and the publisher together.
pub struct Discovery<I> {
    config: Config,
    inventory: I,
    publisher: Publisher,
}

impl<I: Inventory> Discovery<I> {
    pub fn new(config: Config, inventory: I) -> Self {
        let publisher = Publisher::new(config.output_file.clone());

        Discovery {
            config,
            inventory,
            publisher,
        }
    }

    /// Run one fetch, map and publish cycle. When it fails the output file
    /// is left untouched.
    pub async fn cycle(&self) -> Result<CycleReport> {
        info!(message = "gathering droplets");

        let droplets = fetch_all(
            &self.inventory,
            self.config.per_page,
            self.config.request_timeout,
        )
        .await?;
        let targets = to_targets(&droplets, self.config.service_port)?;
        let bytes = self.publisher.publish(&targets)?;

        info!(
            message = "written",
            path = ?self.publisher.path(),
            droplets = droplets.len(),
            targets = targets.len(),
        );

        Ok(CycleReport {
            droplets: droplets.len(),
            targets: targets.len(),
            bytes,
        })
    }

    /// Run cycles forever, sleeping `interval` between them. It only
    /// returns when a cycle failed.
    pub async fn run(&self) -> Result<Infallible> {
        loop {
            self.cycle().await?;

            tokio::time::sleep(self.config.interval).await;
        }
    }
}
