use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use argh::FromArgs;
use digitalocean_sd::config::{self, Config, ConfigError, SecretString};
use digitalocean_sd::discovery::Discovery;
use digitalocean_sd::http::HttpClient;
use digitalocean_sd::{digitalocean, get_version, trace};
use exitcode::ExitCode;
use tracing::{error, info};

const TOKEN_ENV: &str = "DO_TOKEN";
const LOG_ENV: &str = "DO_SD_LOG";

fn parse_duration_arg(text: &str) -> Result<Duration, String> {
    humantime::parse_duration(text).map_err(|err| err.to_string())
}

#[derive(FromArgs)]
#[argh(
    description = "Generate Prometheus file_sd targets from DigitalOcean droplets",
    help_triggers("-h", "--help")
)]
pub struct RootCommand {
    #[argh(switch, short = 'v', description = "show version")]
    version: bool,

    #[argh(
        option,
        short = 'l',
        default = "\"info\".to_string()",
        description = "log level, DO_SD_LOG overrides it"
    )]
    log_level: String,

    #[argh(
        option,
        default = "PathBuf::from(config::DEFAULT_OUTPUT_FILE)",
        description = "path of the file_sd document to write"
    )]
    output_file: PathBuf,

    #[argh(
        option,
        description = "digitalocean api token, falls back to the DO_TOKEN environment variable"
    )]
    token: Option<String>,

    #[argh(
        option,
        default = "config::DEFAULT_SERVICE_PORT",
        description = "port appended to the public address of every droplet"
    )]
    service_port: u16,

    #[argh(
        option,
        default = "config::DEFAULT_INTERVAL",
        from_str_fn(parse_duration_arg),
        description = "time to sleep between refreshes, e.g. 30s, 1m, 1h30m"
    )]
    sleep: Duration,

    #[argh(
        option,
        default = "config::DEFAULT_ENDPOINT.to_string()",
        description = "base url of the digitalocean api"
    )]
    api_endpoint: String,

    #[argh(
        option,
        default = "config::MAX_PER_PAGE",
        description = "droplets requested per page, at most 200"
    )]
    per_page: u32,

    #[argh(
        option,
        from_str_fn(parse_duration_arg),
        description = "deadline of every page request, no deadline by default"
    )]
    request_timeout: Option<Duration>,

    #[argh(switch, description = "run a single refresh and exit")]
    once: bool,
}

impl RootCommand {
    #![allow(clippy::print_stdout)]
    fn show_version(&self) {
        println!("digitalocean-sd {}", get_version());
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let token = match &self.token {
            Some(token) => token.clone(),
            None => std::env::var(TOKEN_ENV).map_err(|_| ConfigError::MissingToken)?,
        };

        let config = Config {
            output_file: self.output_file.clone(),
            token: SecretString::from(token),
            service_port: self.service_port,
            interval: self.sleep,
            endpoint: config::parse_endpoint(&self.api_endpoint)?,
            per_page: self.per_page,
            request_timeout: self.request_timeout,
        };

        config.validate()
    }

    pub fn run(&self) -> Result<(), ExitCode> {
        if self.version {
            self.show_version();
            return Ok(());
        }

        let log_level = std::env::var(LOG_ENV).unwrap_or(self.log_level.clone());
        let color = std::io::stdout().is_terminal();
        trace::init(color, &trace::levels(&log_level));

        let config = self.build_config().map_err(|err| {
            error!(message = "invalid configuration", %err);

            exitcode::CONFIG
        })?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()
            .map_err(|err| {
                error!(message = "build tokio runtime failed", %err);

                exitcode::OSERR
            })?;

        let http = HttpClient::new().map_err(|err| {
            error!(message = "build http client failed", %err);

            exitcode::SOFTWARE
        })?;
        let client = digitalocean::Client::new(http, &config.endpoint, &config.token).map_err(
            |err| {
                error!(message = "invalid configuration", %err);

                exitcode::USAGE
            },
        )?;

        info!(
            message = "start digitalocean-sd",
            version = get_version(),
            output = ?config.output_file,
            endpoint = %config.endpoint,
            service_port = config.service_port,
            interval = ?config.interval,
        );

        let once = self.once;
        runtime.block_on(async move {
            let discovery = Discovery::new(config, client);

            if once {
                let report = discovery.cycle().await.map_err(|err| {
                    error!(message = "refresh failed", %err);

                    exitcode::SOFTWARE
                })?;

                info!(
                    message = "refresh finished",
                    droplets = report.droplets,
                    targets = report.targets,
                    bytes = report.bytes,
                );

                return Ok(());
            }

            tokio::select! {
                result = discovery.run() => match result {
                    Ok(never) => match never {},
                    Err(err) => {
                        error!(message = "refresh failed", %err);

                        Err(exitcode::SOFTWARE)
                    }
                },

                result = shutdown_signal() => match result {
                    Ok(signal) => {
                        info!(message = "shutdown signal received", signal);

                        Ok(())
                    }
                    Err(err) => {
                        error!(message = "listen for shutdown signals failed", %err);

                        Err(exitcode::OSERR)
                    }
                },
            }
        })
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|_| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "CTRL-C")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<RootCommand, argh::EarlyExit> {
        RootCommand::from_args(&["digitalocean-sd"], args)
    }

    #[test]
    fn defaults() {
        let cmd = parse(&["--token", "dop_v1_token"]).unwrap();
        let config = cmd.build_config().unwrap();

        assert_eq!(config.output_file, PathBuf::from("do_sd.json"));
        assert_eq!(config.service_port, 9100);
        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.per_page, 200);
        assert_eq!(config.request_timeout, None);
        assert_eq!(&*config.token, "dop_v1_token");
        assert!(!cmd.once);
    }

    #[test]
    fn all_flags() {
        let cmd = parse(&[
            "--token",
            "t",
            "--output-file",
            "/etc/prometheus/do.json",
            "--service-port",
            "9256",
            "--sleep",
            "1h30m",
            "--api-endpoint",
            "http://127.0.0.1:8080",
            "--per-page",
            "50",
            "--request-timeout",
            "10s",
            "-l",
            "debug",
            "--once",
        ])
        .unwrap();
        let config = cmd.build_config().unwrap();

        assert_eq!(config.output_file, PathBuf::from("/etc/prometheus/do.json"));
        assert_eq!(config.service_port, 9256);
        assert_eq!(config.interval, Duration::from_secs(90 * 60));
        assert_eq!(config.endpoint.host(), Some("127.0.0.1"));
        assert_eq!(config.per_page, 50);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(10)));
        assert_eq!(cmd.log_level, "debug");
        assert!(cmd.once);
    }

    #[test]
    fn durations() {
        let cmd = parse(&["--token", "t", "--sleep", "300ms", "--request-timeout", "2m 30s"])
            .unwrap();
        assert_eq!(cmd.sleep, Duration::from_millis(300));
        assert_eq!(cmd.request_timeout, Some(Duration::from_secs(150)));

        let cmd = parse(&["--token", "t", "--sleep", "0s"]).unwrap();
        assert!(matches!(cmd.build_config(), Err(ConfigError::ZeroInterval)));

        assert!(parse(&["--sleep", "1x"]).is_err());
    }

    #[test]
    fn invalid_flags() {
        assert!(parse(&["--sleep", "10"]).is_err());
        assert!(parse(&["--sleep", "-1m"]).is_err());
        assert!(parse(&["--service-port", "65536"]).is_err());

        let cmd = parse(&["--token", "t", "--per-page", "500"]).unwrap();
        assert!(matches!(
            cmd.build_config(),
            Err(ConfigError::InvalidPerPage(500))
        ));

        let cmd = parse(&["--token", "t", "--api-endpoint", "ftp://example.com"]).unwrap();
        assert!(matches!(
            cmd.build_config(),
            Err(ConfigError::UnsupportedEndpoint(_))
        ));
    }
}
