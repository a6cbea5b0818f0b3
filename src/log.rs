use crate::error::{Error, Result};
use once_cell::sync::OnceCell;
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "APPLIST_LOG";

static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Installs a global subscriber writing to `log_file`.
///
/// `APPLIST_LOG` wins over `default_level` when set. Calling this twice is a
/// no-op that returns the same path.
pub fn init_tracing(log_file: &Path, default_level: &str) -> Result<String> {
    let log_path = log_file.to_string_lossy().into_owned();
    if LOG_GUARD.get().is_some() {
        return Ok(log_path);
    }

    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    let (writer, guard) = tracing_appender::non_blocking(file);
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| Error::Logging(e.to_string()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true),
        )
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    let _ = LOG_GUARD.set(guard);
    Ok(log_path)
}

/// Stderr logging for interactive use.
pub fn init_stderr_tracing(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| Error::Logging(e.to_string()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}
