//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence over `--log-level`. Logs go to stderr unless a
//! log file is given; the dashboard passes `to_stderr = false` because it owns
//! the terminal.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Install the global subscriber.
///
/// With no log file and `to_stderr = false`, logging stays disabled.
pub fn init_logging(level: &str, log_file: Option<&Path>, to_stderr: bool) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| AppError::new(2, format!("Invalid log level '{level}': {e}")))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    let installed = if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| AppError::new(2, format!("Failed to open log file '{}': {e}", path.display())))?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    } else if to_stderr {
        builder.with_writer(std::io::stderr).try_init()
    } else {
        return Ok(());
    };

    // A second initialization (e.g. from tests) keeps the first subscriber.
    if let Err(e) = installed {
        tracing::debug!("tracing subscriber already set: {e}");
    }
    Ok(())
}
