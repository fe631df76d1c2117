use std::time::Duration;

use thiserror::Error;

use crate::cipher::DecryptError;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("http status {status} fetching {url}")]
    HttpStatus { status: u16, url: String },
    #[error("decrypt error: {0}")]
    DecryptError(#[from] DecryptError),
    #[error("manifest parse error: {0}")]
    ManifestParseError(String),
    #[error("embed chain exceeded {0} nested pages")]
    ResolutionDepthExceeded(usize),
    #[error("missing expected field: {0}")]
    MissingField(String),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("no streams found")]
    NoStreamsFound,
    #[error("unsupported hoster: {0}")]
    UnsupportedHoster(String),
    #[error("no playable source found: all {attempted} sources failed")]
    AllSourcesFailed { attempted: usize },
    #[error("no playable source found: deadline of {0:?} elapsed before any source completed")]
    DeadlineExceeded(Duration),
    #[error("invalid configuration: {0}")]
    ConfigError(String),
}

impl ResolveError {
    /// Errors that reached no further than a network fetch.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            ResolveError::HttpError(_) | ResolveError::HttpStatus { .. }
        )
    }

    /// Errors the aggregate surfaces to the caller; everything else stays
    /// local to one candidate.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ResolveError::AllSourcesFailed { .. } | ResolveError::DeadlineExceeded(_)
        )
    }
}

impl From<url::ParseError> for ResolveError {
    fn from(e: url::ParseError) -> Self {
        ResolveError::InvalidUrl(e.to_string())
    }
}
