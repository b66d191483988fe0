use std::fs;
use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `b_if_verbose`.
pub fn setup_logging(log_path: Option<&Path>, b_if_verbose: bool) {
    let c_level_default = if b_if_verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(c_level_default));

    // Try to open log file, fall back to stderr
    if let Some(log_path) = log_path
        && let Ok(file) = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
