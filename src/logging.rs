use crate::config::Config;
use crate::error::{Result, TdError};

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Filter directives, e.g. `TD_LOG=debug`.
pub const FILTER_ENV: &str = "TD_LOG";
/// Log destination; overrides `log_file` in the config.
pub const FILE_ENV: &str = "TD_LOG_FILE";

/// Install a file subscriber when a log file is configured.
///
/// The terminal UI owns stdout and stderr, so without a file nothing is
/// installed and events are dropped.
pub fn init(config: &Config) -> Result<()> {
    let path = std::env::var_os(FILE_ENV)
        .map(PathBuf::from)
        .or_else(|| config.resolved_log_file());
    let Some(path) = path else {
        return Ok(());
    };

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let filter = EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| TdError::Other(format!("failed to install logger: {}", e)))?;

    tracing::debug!(path = %path.display(), "logging started");
    Ok(())
}
