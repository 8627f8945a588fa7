use tracing_subscriber::EnvFilter;

/// Initializes the global subscriber. The filter comes from `RUST_LOG` and
/// defaults to `info`; setting `LOG_FORMAT=json` switches to structured output
/// for log collectors.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
