//! Logging setup
//!
//! Installs a `tracing` subscriber with a size-rotating file layer and an
//! optional stderr layer. `RUST_LOG` overrides the configured level.

mod rotating;

pub use rotating::{RotatingFileWriter, rotated_path};

use std::path::PathBuf;

use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::Settings;

/// Translate a configured level name into a filter directive.
/// Accepts `WARNING` and `CRITICAL` as aliases.
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" | "FATAL" => "error",
        "OFF" => "off",
        _ => "info",
    }
}

/// Install the global subscriber and return the log file path.
///
/// A subscriber that is already installed is left in place, so calling this
/// more than once in a process is harmless.
pub fn init_logging(settings: &Settings) -> std::io::Result<PathBuf> {
    let logging = &settings.logging;
    let path = settings.log_file_path();
    let writer = RotatingFileWriter::new(
        &path,
        logging.max_file_size_mb.saturating_mul(1024 * 1024),
        logging.backup_count,
    )?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(&logging.level)));
    let file_layer = fmt::layer().with_writer(writer).with_ansi(false);
    let console_layer = logging
        .console
        .then(|| fmt::layer().with_writer(std::io::stderr).with_target(false));

    if tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .is_err()
    {
        debug!("Global subscriber already installed");
    }
    Ok(path)
}
