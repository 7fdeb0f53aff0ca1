//! Tracing/logging setup shared by the binaries.

pub mod config;

pub use config::{LogConfig, LogFormat};

use tracing_subscriber::EnvFilter;

/// Install the process-wide subscriber.
///
/// Filtering comes from `RUST_LOG` (default `info`). Safe to call multiple
/// times; later calls are no-ops.
pub fn init(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .try_init(),
    };

    if installed.is_ok() {
        if let Some(raw) = &config.unrecognized_format {
            tracing::warn!(value = %raw, "unrecognized log format; using json");
        }
    }
}
