use s3_sample_core::contract::ENV_LOG_LEVEL;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_LEVEL: &str = "info";

/// JSON lines on stderr, filtered by `LOG_LEVEL` (`info` when unset or invalid).
pub fn init_logging() {
    let filter = log_filter(std::env::var(ENV_LOG_LEVEL).ok().as_deref());
    // A subscriber may already be installed by the host runtime.
    let _ = tracing_subscriber::fmt()
        .json()
        .with_current_span(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn log_filter(level: Option<&str>) -> EnvFilter {
    level
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .and_then(|level| EnvFilter::try_new(level.to_ascii_lowercase()).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL))
}
