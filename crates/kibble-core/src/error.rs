//! Domain-level error types.

use thiserror::Error;

use crate::ports::CatalogError;

/// Search errors - everything the pipeline can fail with after admission.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The caller asked for something this catalog cannot serve,
    /// e.g. ingredient filters when no ingredient data is published.
    #[error("Unsupported filter: {0}")]
    CapabilityMismatch(String),

    #[error("Catalog unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CatalogError> for SearchError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Unavailable(msg) => SearchError::UpstreamUnavailable(msg),
            CatalogError::NotFound(what) => SearchError::Internal(format!("not found: {what}")),
            CatalogError::Invalid(msg) => SearchError::Internal(msg),
        }
    }
}
