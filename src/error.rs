use std::sync::Arc;
use thiserror::Error;

/// Source-layer error type.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Source error shared between every caller joined on the same load.
pub type SharedSourceError = Arc<dyn std::error::Error + Send + Sync>;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The permission source could not be reached or refused the request.
    #[error("permission source unavailable: {0}")]
    SourceUnavailable(#[source] SharedSourceError),
    /// Invalid identifier input.
    #[error("invalid id: {0}")]
    InvalidId(String),
    /// Invalid permission input.
    #[error("invalid permission: {0}")]
    InvalidPermission(String),
}

impl From<SourceError> for Error {
    fn from(error: SourceError) -> Self {
        Self::SourceUnavailable(Arc::from(error))
    }
}

impl From<SharedSourceError> for Error {
    fn from(error: SharedSourceError) -> Self {
        Self::SourceUnavailable(error)
    }
}
