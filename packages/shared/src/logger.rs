//! Logging setup utilities for SignalHub binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tracing target of the server library
const SERVER_TARGET: &str = "signalhub_server";
/// Tracing target of this crate
const SHARED_TARGET: &str = "signalhub_shared";

/// Initialize the tracing subscriber with the specified default log level.
///
/// The filter covers the server library, this crate, `tower_http` and the
/// calling binary. It can be overridden with the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "signalhub-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn")
///
/// # Examples
///
/// ```no_run
/// use signalhub_shared::logger::setup_logger;
///
/// setup_logger("signalhub-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into());
    let directives = filter.to_string();

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!("Logger initialized with filter '{}'", directives);
}

fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    let mut targets = vec![SERVER_TARGET, SHARED_TARGET, "tower_http"];
    if !targets.contains(&binary_target.as_str()) {
        targets.push(&binary_target);
    }

    targets
        .iter()
        .map(|target| format!("{}={}", target, default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}
