//! Rate-limit admission.
//!
//! [`Admission`] is an extractor: actix resolves it before the handler body
//! runs, so a denied request never reaches the catalog.

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, web};
use futures::future::LocalBoxFuture;
use serde::Serialize;

use kibble_shared::RateLimitInfo;

use super::error::{ApiError, AppError};
use crate::state::AppState;

/// Header carrying the caller's session identifier.
pub static SESSION_HEADER: &str = "X-Session-Id";

const MAX_SESSION_ID_LEN: usize = 128;

/// Response headers mirroring the `rateLimit` body field.
pub fn rate_limit_headers(info: &RateLimitInfo) -> [(&'static str, String); 3] {
    [
        ("X-RateLimit-Limit", info.limit.to_string()),
        ("X-RateLimit-Remaining", info.remaining.to_string()),
        ("X-RateLimit-Reset", info.reset_epoch_ms.to_string()),
    ]
}

/// Proof that the request was admitted, with the identity's rate-limit state.
#[derive(Debug, Clone)]
pub struct Admission {
    pub identity: String,
    pub rate_limit: RateLimitInfo,
}

impl Admission {
    /// Turn any handler failure into a response that still reports rate-limit state.
    pub fn fail(&self, error: impl Into<AppError>) -> ApiError {
        error.into().metered(self.rate_limit)
    }

    /// 200 with JSON body and rate-limit headers.
    pub fn ok_json<T: Serialize>(&self, body: &T) -> HttpResponse {
        let mut response = HttpResponse::Ok();
        for header in rate_limit_headers(&self.rate_limit) {
            response.insert_header(header);
        }
        response.json(body)
    }
}

/// Session header if present, else the client address.
fn identify(req: &HttpRequest) -> String {
    let session = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.len() <= MAX_SESSION_ID_LEN);

    if let Some(session) = session {
        return format!("session:{}", session);
    }

    match req.connection_info().realip_remote_addr() {
        Some(addr) => format!("ip:{}", addr),
        None => "anonymous".to_string(),
    }
}

impl FromRequest for Admission {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let identity = identify(req);

        Box::pin(async move {
            let state = match state {
                Some(state) => state,
                None => {
                    return Err(AppError::Internal("AppState not found in app data".to_string()).into());
                }
            };

            let limit = state.limiter.limit();
            let result = match state.limiter.check(&identity).await {
                Ok(result) => result,
                Err(e) => {
                    // Fail open
                    tracing::error!(identity = %identity, error = %e, "Rate limiter error, failing open");
                    return Ok(Admission {
                        identity,
                        rate_limit: RateLimitInfo {
                            limit,
                            remaining: limit,
                            reset_epoch_ms: 0,
                        },
                    });
                }
            };

            let rate_limit = RateLimitInfo {
                limit,
                remaining: result.remaining,
                reset_epoch_ms: result.reset_epoch_ms,
            };

            if !result.allowed {
                tracing::warn!(identity = %identity, "Rate limit exceeded");
                return Err(AppError::RateLimited {
                    retry_after_secs: result.retry_after_secs(),
                }
                .metered(rate_limit));
            }

            Ok(Admission {
                identity,
                rate_limit,
            })
        })
    }
}
