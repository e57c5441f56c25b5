//! Diagnostic log file setup.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::StartupError;

const DEFAULT_FILTER: &str = "chat_app=debug,chat_provider_gemini=debug,gemini_api=debug";

/// Creates or truncates the log file.
pub fn open_log_file(path: &Path) -> Result<File, StartupError> {
    File::create(path).map_err(|source| StartupError::LogOpen {
        path: path.to_path_buf(),
        source,
    })
}

/// Routes `tracing` output to `path` for the rest of the process.
///
/// Only opening the file can fail. A second call keeps the first subscriber.
pub fn init(path: &Path) -> Result<(), StartupError> {
    let file = open_log_file(path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_thread_names(true)
        .try_init();
    Ok(())
}
