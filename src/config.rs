use std::fmt::Formatter;
use std::ops::Deref;
use std::path::PathBuf;
use std::time::Duration;

use http::Uri;
use http::uri::InvalidUri;
use thiserror::Error;

pub const DEFAULT_OUTPUT_FILE: &str = "do_sd.json";
pub const DEFAULT_ENDPOINT: &str = "https://api.digitalocean.com";
pub const DEFAULT_SERVICE_PORT: u16 = 9100;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);
/// The droplets API refuses anything larger.
pub const MAX_PER_PAGE: u32 = 200;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("api token is required, set it with --token or the DO_TOKEN environment variable")]
    MissingToken,
    #[error("api token contains invalid characters")]
    InvalidToken,
    #[error("invalid api endpoint {endpoint:?}, {err}")]
    InvalidEndpoint { endpoint: String, err: InvalidUri },
    #[error("api endpoint {0} must be an absolute http or https url")]
    UnsupportedEndpoint(Uri),
    #[error("per page must be between 1 and 200, got {0}")]
    InvalidPerPage(u32),
    #[error("sleep interval must be greater than zero")]
    ZeroInterval,
}

/// A simple wrapper for sensitive strings containing credentials, it
/// never shows up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        SecretString(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        SecretString(value.to_string())
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("******")
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("******")
    }
}

impl Deref for SecretString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}

/// Everything the discovery loop needs, built once at startup and never
/// changed afterwards.
#[derive(Clone, Debug)]
pub struct Config {
    /// Where the file_sd document is written.
    pub output_file: PathBuf,

    /// DigitalOcean API token.
    pub token: SecretString,

    /// Port appended to the public address of every droplet.
    pub service_port: u16,

    /// How long to sleep between two refreshes.
    pub interval: Duration,

    /// Base URL of the DigitalOcean API.
    pub endpoint: Uri,

    /// Droplets requested per page.
    pub per_page: u32,

    /// Deadline of every single page request, no deadline if not set.
    pub request_timeout: Option<Duration>,
}

impl Config {
    pub fn new(token: impl Into<SecretString>) -> Self {
        Config {
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            token: token.into(),
            service_port: DEFAULT_SERVICE_PORT,
            interval: DEFAULT_INTERVAL,
            endpoint: Uri::from_static(DEFAULT_ENDPOINT),
            per_page: MAX_PER_PAGE,
            request_timeout: None,
        }
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }

        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(ConfigError::InvalidPerPage(self.per_page));
        }

        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }

        check_endpoint(&self.endpoint)?;

        Ok(self)
    }
}

fn check_endpoint(uri: &Uri) -> Result<(), ConfigError> {
    let supported = matches!(uri.scheme_str(), Some("http") | Some("https"));
    if !supported || uri.authority().is_none() {
        return Err(ConfigError::UnsupportedEndpoint(uri.clone()));
    }

    Ok(())
}

pub fn parse_endpoint(text: &str) -> Result<Uri, ConfigError> {
    let uri = text
        .parse::<Uri>()
        .map_err(|err| ConfigError::InvalidEndpoint {
            endpoint: text.to_string(),
            err,
        })?;

    check_endpoint(&uri)?;

    Ok(uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_redacted() {
        let config = Config::new("dop_v1_secret");

        assert_eq!(config.token.to_string(), "******");
        assert!(!format!("{config:?}").contains("dop_v1_secret"));
        assert_eq!(&*config.token, "dop_v1_secret");
    }

    #[test]
    fn defaults() {
        let config = Config::new("token").validate().unwrap();

        assert_eq!(config.output_file, PathBuf::from("do_sd.json"));
        assert_eq!(config.service_port, 9100);
        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.endpoint.scheme_str(), Some("https"));
        assert_eq!(config.endpoint.host(), Some("api.digitalocean.com"));
        assert_eq!(config.per_page, 200);
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn validate() {
        assert!(matches!(
            Config::new("").validate(),
            Err(ConfigError::MissingToken)
        ));
        assert!(matches!(
            Config::new("  ").validate(),
            Err(ConfigError::MissingToken)
        ));

        let mut config = Config::new("token");
        config.per_page = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPerPage(0))
        ));

        let mut config = Config::new("token");
        config.per_page = 201;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPerPage(201))
        ));

        let mut config = Config::new("token");
        config.interval = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroInterval)));
    }

    #[test]
    fn endpoint() {
        let uri = parse_endpoint("http://127.0.0.1:8080").unwrap();
        assert_eq!(uri.port_u16(), Some(8080));

        assert!(matches!(
            parse_endpoint("api.digitalocean.com"),
            Err(ConfigError::UnsupportedEndpoint(_))
        ));
        assert!(matches!(
            parse_endpoint("ftp://api.digitalocean.com"),
            Err(ConfigError::UnsupportedEndpoint(_))
        ));
        assert!(matches!(
            parse_endpoint("http://exa mple.com"),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }
}
