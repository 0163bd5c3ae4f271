//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when neither `RUST_LOG` nor `--log-level` is given.
pub(crate) const DEFAULT_LOG_LEVEL: &str = "warn";

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `log_level`. Output goes to stderr so
/// stdout only carries tables and reports.
pub(crate) fn init_logging(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}
