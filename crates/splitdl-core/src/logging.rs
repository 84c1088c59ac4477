//! Logging init: append to a file under the XDG state dir, or fall back to stderr.
//!
//! The progress line owns stdout, so tracing output goes to
//! `~/.local/state/splitdl/splitdl.log` whenever possible.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,splitdl_core=debug,splitdl=debug";
const LOG_FILE_NAME: &str = "splitdl.log";

/// `RUST_LOG` if set and valid, otherwise [`DEFAULT_FILTER`].
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Location of the log file; the state directory is created if missing.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("splitdl")?;
    xdg_dirs
        .place_state_file(LOG_FILE_NAME)
        .context("cannot create log directory")
}

/// Initialize structured logging to the state-dir log file.
/// Returns Err (log dir unwritable, subscriber already set) so the caller can
/// fall back to [`init_logging_stderr`].
pub fn init_logging() -> Result<PathBuf> {
    let path = log_file_path()?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    // `&File` is a writer, so one shared handle serves every event.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    tracing::info!("splitdl logging initialized at {}", path.display());
    Ok(path)
}

/// Initialize logging to stderr only. Never fails; a second init is ignored.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
