use stream_resolver::{DecryptError, ResolveError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    #[error("decryption failed: {0}")]
    Decrypt(#[from] DecryptError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no streams found")]
    NoStreamsFound,

    #[error("configuration error: {0:#}")]
    Config(#[from] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        CliError::InvalidInput(message.into())
    }

    pub fn no_streams_found() -> Self {
        CliError::NoStreamsFound
    }
}
