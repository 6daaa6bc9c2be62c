//! Logging initialization.
//!
//! Diagnostics are emitted through `tracing` and are not part of the startup
//! contract; a process that never initializes logging still behaves the same.

use crate::config::{GlobalConfig, LogFormat};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system from the global configuration.
///
/// `override_level` (typically from the command line) wins over the
/// configured level, and the `RUST_LOG` environment variable wins over both.
/// Must be called at most once per process.
pub fn init_logging(global: &GlobalConfig, override_level: Option<&str>) {
    let level = override_level.unwrap_or(&global.log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match global.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }
}
