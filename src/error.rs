use thiserror::Error;

/// Failures surfaced by a catalog client.
///
/// Callers decide which of these are fatal: the workflow treats `Auth` as a
/// job failure and isolates everything else to the artist, album or batch
/// that produced it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unauthorized: {0}")]
    Auth(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate_limited: retry_after={retry_after:?}")]
    RateLimited { retry_after: Option<u64> },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("catalog api error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not decode catalog response: {0}")]
    Decode(String),

    #[error("batch of {size} uris exceeds the limit of {max} per request")]
    BatchTooLarge { size: usize, max: usize },
}

impl CatalogError {
    pub fn is_auth(&self) -> bool {
        matches!(self, CatalogError::Auth(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CatalogError::RateLimited { .. })
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            CatalogError::Decode(e.to_string())
        } else {
            CatalogError::Transport(e.to_string())
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
