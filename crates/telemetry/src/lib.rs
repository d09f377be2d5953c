//! Logging and tracing bootstrap.

use tracing_subscriber::EnvFilter;

use bookly_kernel::settings::{LogFormat, TelemetrySettings};

/// Initialize the tracing pipeline from settings. `RUST_LOG` overrides the
/// configured default filter. Safe to call more than once; later calls are
/// no-ops.
pub fn init(settings: &TelemetrySettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.default_filter));

    let result = match settings.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init(),
    };

    if result.is_ok() {
        tracing::info!(
            target: "bookly-telemetry",
            format = ?settings.log_format,
            "telemetry initialized"
        );
    }
}
