//! RFC 7807 problem details, extended with rate-limit metadata.

use serde::{Deserialize, Serialize};

use crate::dto::RateLimitInfo;

/// RFC 7807 Problem Details for HTTP APIs.
///
/// See: https://datatracker.ietf.org/doc/html/rfc7807
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub error_type: String,

    /// A short, human-readable summary of the problem type.
    pub title: String,

    /// The HTTP status code.
    pub status: u16,

    /// A human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitInfo>,
}

impl ErrorResponse {
    pub fn new(status: u16, title: impl Into<String>) -> Self {
        Self {
            error_type: "about:blank".to_string(),
            title: title.into(),
            status,
            detail: None,
            retry_after_seconds: None,
            rate_limit: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: Option<RateLimitInfo>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after_seconds = Some(seconds);
        self
    }

    // Common error constructors
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(400, "Bad Request").with_detail(detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(404, "Not Found").with_detail(detail)
    }

    pub fn too_many_requests(retry_after_seconds: u64) -> Self {
        Self::new(429, "Too Many Requests")
            .with_detail(format!(
                "Rate limit exceeded. Try again in {retry_after_seconds} seconds."
            ))
            .with_retry_after(retry_after_seconds)
    }

    pub fn service_unavailable() -> Self {
        Self::new(503, "Service Unavailable")
            .with_detail("The product catalog is temporarily unavailable. Please retry shortly.")
    }

    pub fn internal_error() -> Self {
        Self::new(500, "Internal Server Error")
            .with_detail("Something went wrong while handling the request.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_body_shape() {
        let body = ErrorResponse::too_many_requests(12).with_rate_limit(Some(RateLimitInfo {
            limit: 60,
            remaining: 0,
            reset_epoch_ms: 1_700_000_000_000,
        }));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "about:blank");
        assert_eq!(json["status"], 429);
        assert_eq!(json["retryAfterSeconds"], 12);
        assert_eq!(json["rateLimit"]["resetEpochMs"], 1_700_000_000_000u64);
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let json = serde_json::to_value(ErrorResponse::new(400, "Bad Request")).unwrap();
        assert!(json.get("detail").is_none());
        assert!(json.get("rateLimit").is_none());
    }
}
