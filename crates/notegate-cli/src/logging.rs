//! Log subscriber setup
//!
//! Logs go to stderr; stdout carries the hook protocol.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "NOTEGATE_LOG";

/// Filter used when [`LOG_ENV`] is unset or invalid
pub const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber
///
/// A second call is a no-op.
pub fn init(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    if installed.is_err() {
        tracing::debug!("log subscriber already installed");
    }
}
