use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::digitalocean::Droplet;

// `__meta_` labels are dropped by Prometheus after relabeling.
pub const LABEL_ID: &str = "__meta_do_id";
pub const LABEL_NAME: &str = "__meta_do_name";
pub const LABEL_TAGS: &str = "__meta_do_tags";
pub const LABEL_STATUS: &str = "__meta_do_status";
pub const LABEL_PRIVATE_IP: &str = "__meta_do_private_ip";
pub const LABEL_PUBLIC_IP: &str = "__meta_do_public_ip";
pub const LABEL_REGION: &str = "__meta_do_region";
pub const LABEL_SIZE: &str = "__meta_do_size";

/// Labels are kept sorted by name, so the same droplets always produce the
/// same bytes on disk.
pub type LabelSet = BTreeMap<String, String>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("could not find a public ipv4 addr of droplet {id}")]
    NoPublicIpv4 { id: u64 },

    #[error("could not find a private ipv4 addr of droplet {id}")]
    NoPrivateIpv4 { id: u64 },
}

/// Target is a target group of Prometheus' file_sd format, with exactly one
/// address.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Target {
    pub targets: Vec<String>,
    pub labels: LabelSet,
}

/// Build a `host:port` string, IPv6 hosts are wrapped in brackets.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Map one droplet to its target, `Ok(None)` if the droplet has no IPv4
/// networks yet (e.g. it is still being created).
///
/// A droplet with IPv4 networks must have both a public and a private
/// address.
pub fn to_target(droplet: &Droplet, port: u16) -> Result<Option<Target>, MapError> {
    if droplet.networks.v4.is_empty() {
        return Ok(None);
    }

    let public = droplet
        .public_ipv4()
        .filter(|addr| !addr.is_empty())
        .ok_or(MapError::NoPublicIpv4 { id: droplet.id })?;
    let private = droplet
        .private_ipv4()
        .ok_or(MapError::NoPrivateIpv4 { id: droplet.id })?;

    let mut labels = LabelSet::new();
    labels.insert(LABEL_ID.to_string(), droplet.id.to_string());
    labels.insert(LABEL_PUBLIC_IP.to_string(), public.to_string());
    if !private.is_empty() {
        labels.insert(LABEL_PRIVATE_IP.to_string(), private.to_string());
    }
    labels.insert(LABEL_STATUS.to_string(), droplet.status.clone());
    labels.insert(LABEL_REGION.to_string(), droplet.region.slug.clone());
    labels.insert(LABEL_SIZE.to_string(), droplet.size_slug.clone());
    labels.insert(LABEL_NAME.to_string(), droplet.name.clone());
    labels.insert(LABEL_TAGS.to_string(), droplet.tags.join(","));

    Ok(Some(Target {
        targets: vec![join_host_port(public, port)],
        labels,
    }))
}

/// Map all droplets, keeping their order. The first droplet that can not be
/// mapped fails the whole batch.
pub fn to_targets(droplets: &[Droplet], port: u16) -> Result<Vec<Target>, MapError> {
    let mut targets = Vec::with_capacity(droplets.len());

    for droplet in droplets {
        match to_target(droplet, port)? {
            Some(target) => targets.push(target),
            None => {
                debug!(
                    message = "skip droplet without ipv4 networks",
                    id = droplet.id,
                    name = %droplet.name,
                );
            }
        }
    }

    Ok(targets)
}
