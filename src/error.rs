use thiserror::Error;

use crate::config::ConfigError;
use crate::http::HttpError;
use crate::inventory::FetchError;
use crate::publish::PublishError;
use crate::target::MapError;

/// Everything that can stop a discovery cycle, or the process before the
/// first cycle starts.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not get the list of droplets, {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("build http client failed, {0}")]
    Http(#[from] HttpError),

    #[error("invalid configuration, {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
