use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global tracing subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}
