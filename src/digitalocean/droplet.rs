use serde::{Deserialize, Deserializer};

/// The API sends `null` for some empty lists.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Not all field included, only the field we need
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Droplet {
    pub id: u64,

    #[serde(default)]
    pub name: String,

    /// "new", "active", "off" or "archive"
    #[serde(default)]
    pub status: String,

    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,

    #[serde(default)]
    pub region: Region,

    #[serde(default)]
    pub size_slug: String,

    #[serde(default, deserialize_with = "nullable")]
    pub networks: Networks,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Region {
    #[serde(default)]
    pub slug: String,

    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Networks {
    #[serde(default, deserialize_with = "nullable")]
    pub v4: Vec<NetworkV4>,

    #[serde(default, deserialize_with = "nullable")]
    pub v6: Vec<NetworkV6>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct NetworkV4 {
    pub ip_address: String,

    #[serde(default)]
    pub netmask: String,

    #[serde(default)]
    pub gateway: String,

    /// "public" or "private"
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct NetworkV6 {
    pub ip_address: String,

    #[serde(default)]
    pub netmask: u8,

    #[serde(default)]
    pub gateway: String,

    #[serde(rename = "type")]
    pub kind: String,
}

impl Droplet {
    /// The first public IPv4 address, `None` if the droplet has no public
    /// IPv4 network at all.
    pub fn public_ipv4(&self) -> Option<&str> {
        self.ipv4("public")
    }

    /// The first private IPv4 address, `None` if the droplet has no private
    /// IPv4 network at all.
    pub fn private_ipv4(&self) -> Option<&str> {
        self.ipv4("private")
    }

    fn ipv4(&self, kind: &str) -> Option<&str> {
        self.networks
            .v4
            .iter()
            .find(|network| network.kind == kind)
            .map(|network| network.ip_address.as_str())
    }
}
