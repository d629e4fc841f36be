//! Tracing setup for the embedding application.

use storefront_core::LoggingConfig;

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured filter applies, and an
/// unparsable filter falls back to `info`. Returns `false` if a subscriber
/// was already installed.
///
/// - `RUST_LOG=debug` - Debug logs for everything
/// - `RUST_LOG=info,storefront_client=debug` - Debug for the controllers only
pub fn init_tracing(config: &LoggingConfig) -> bool {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&config.filter).unwrap_or_else(|e| {
            eprintln!("Invalid log filter {:?}: {}", config.filter, e);
            EnvFilter::new("info")
        })
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init()
        .is_ok()
}
