use std::sync::Arc;

use thiserror::Error;

/// Error type a fetcher returns. Boxed so any service client error fits.
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a single fetch attempt as observed by the pagination engine.
#[derive(Debug, Clone, Error)]
pub enum PaginationError {
    /// The fetcher rejected. The original error is kept intact.
    #[error("Failed to load page: {0}")]
    Fetch(Arc<dyn std::error::Error + Send + Sync>),

    /// The fetcher resolved without one of the required envelope fields.
    #[error("Malformed response: missing `{missing}`")]
    MalformedResponse { missing: &'static str },
}

impl PaginationError {
    /// Whether the failure came from the remote service rather than
    /// from the shape of its response.
    pub fn is_transient(&self) -> bool {
        matches!(self, PaginationError::Fetch(_))
    }

    /// The error the fetcher rejected with, if any.
    pub fn source_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            PaginationError::Fetch(err) => Some(err.as_ref()),
            PaginationError::MalformedResponse { .. } => None,
        }
    }
}

impl From<FetchError> for PaginationError {
    fn from(err: FetchError) -> Self {
        PaginationError::Fetch(Arc::from(err))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}
