use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LogLevel};

/// Initialize structured logging to stderr.
///
/// - `LogFormat::Text`: human-readable output (interactive default).
/// - `LogFormat::Json`: flattened JSON for log aggregators.
///
/// Uses `RUST_LOG` if set, otherwise the given `level`. Must be called
/// exactly once at startup; stdout stays reserved for command output.
pub fn init_logging(level: LogLevel, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .json()
                    .flatten_event(true)
                    .with_target(true)
                    .with_ansi(false),
            )
            .init(),
    }
}
