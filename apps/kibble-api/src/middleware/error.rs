//! Error handling - RFC 7807 responses carrying rate-limit metadata.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use std::fmt;

use kibble_core::SearchError;
use kibble_core::ports::CatalogError;
use kibble_shared::{ErrorResponse, RateLimitInfo};

use super::rate_limit::rate_limit_headers;

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    /// Filter the catalog cannot serve. Not retryable.
    UnsupportedFilter(String),
    RateLimited { retry_after_secs: u64 },
    Unavailable(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::UnsupportedFilter(msg) => write!(f, "Unsupported filter: {}", msg),
            AppError::RateLimited { retry_after_secs } => {
                write!(f, "Rate limited, retry in {}s", retry_after_secs)
            }
            AppError::Unavailable(msg) => write!(f, "Upstream unavailable: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl AppError {
    /// Attach the caller's rate-limit state.
    pub fn metered(self, rate_limit: RateLimitInfo) -> ApiError {
        ApiError {
            error: self,
            rate_limit: Some(rate_limit),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedFilter(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn to_body(&self) -> ErrorResponse {
        match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::UnsupportedFilter(detail) => {
                ErrorResponse::new(422, "Unsupported Filter").with_detail(detail)
            }
            AppError::RateLimited { retry_after_secs } => {
                ErrorResponse::too_many_requests(*retry_after_secs)
            }
            AppError::Unavailable(detail) => {
                tracing::warn!("Upstream unavailable: {}", detail);
                ErrorResponse::service_unavailable()
            }
            AppError::Internal(detail) => {
                // Full detail stays in the logs
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        }
    }
}

/// An [`AppError`] as sent to the caller, with rate-limit state when
/// admission got far enough to know it.
#[derive(Debug)]
pub struct ApiError {
    pub error: AppError,
    pub rate_limit: Option<RateLimitInfo>,
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self {
            error,
            rate_limit: None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.error.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let body = self.error.to_body().with_rate_limit(self.rate_limit);
        let mut response = HttpResponse::build(self.status_code());

        if let Some(info) = &self.rate_limit {
            for header in rate_limit_headers(info) {
                response.insert_header(header);
            }
        }
        if let AppError::RateLimited { retry_after_secs } = &self.error {
            response.insert_header(("Retry-After", retry_after_secs.to_string()));
        }

        response.json(body)
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Validation(msg) => AppError::BadRequest(msg),
            SearchError::CapabilityMismatch(msg) => AppError::UnsupportedFilter(msg),
            SearchError::UpstreamUnavailable(msg) => AppError::Unavailable(msg),
            SearchError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => AppError::NotFound("Product not found".to_string()),
            CatalogError::Unavailable(msg) => AppError::Unavailable(msg),
            CatalogError::Invalid(msg) => AppError::Internal(format!("catalog: {}", msg)),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, ApiError>;
