use std::io;
use std::path::PathBuf;

use chat_provider::ProviderInitError;
use thiserror::Error;

/// Failures that stop the process before or while bringing the UI up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("environment variable {var} is required but not set")]
    MissingCredential { var: &'static str },

    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidConfig {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("cannot open log file {}: {source}", path.display())]
    LogOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Provider(#[from] ProviderInitError),

    #[error("terminal error: {0}")]
    Terminal(#[source] io::Error),
}
