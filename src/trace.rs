use tracing_subscriber::EnvFilter;

/// Turn a `--log-level` value into filter directives. A plain level only
/// applies to this crate, anything that already looks like directives is
/// used as is.
pub fn levels(level: &str) -> String {
    match level {
        "off" => "off".to_string(),
        directives if directives.contains('=') || directives.contains(',') => {
            directives.to_string()
        }
        level => format!("digitalocean_sd={level}"),
    }
}

/// Install the global fmt subscriber. Calling it twice is harmless, the
/// second subscriber is discarded.
pub fn init(color: bool, levels: &str) {
    let filter = EnvFilter::try_new(levels).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_ansi(color)
        .with_target(false)
        .with_env_filter(filter)
        .try_init();
}
