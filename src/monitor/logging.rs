use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured logging at the default `warn` level
pub fn init_logging() {
    init_logging_with_config("warn", false);
}

/// Initialize structured logging with configurable level and format
///
/// Logs are written to stderr so they never land inside a table frame on stdout.
/// The `RUST_LOG` environment variable takes precedence over `level`.
/// Examples:
/// - `RUST_LOG=debug` - Debug level and above
/// - `RUST_LOG=multiping=debug` - Debug level for multiping crate only
pub fn init_logging_with_config(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
