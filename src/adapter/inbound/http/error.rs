//! Mapping from crate errors to HTTP responses.

use axum::http::header::{HeaderValue, RETRY_AFTER};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::error::{Error, PoolError, ValidationError};
use crate::infrastructure::abuse::{BlockReason, RateDecision};

/// Retry hint sent with transient overload responses (seconds).
const OVERLOAD_RETRY_SECS: u64 = 1;

/// Every non-success outcome a route can produce.
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    BadRequest(&'static str),
    NotFound(&'static str),
    /// The client is blocked by the abuse detector.
    Blocked {
        reason: BlockReason,
        retry_after_secs: u64,
    },
    /// The client exceeded its per-minute budget.
    RateLimited(RateDecision),
    /// Transient overload: no database handle could be obtained.
    Unavailable(PoolError),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(e) => Self::Validation(e),
            Error::Pool(e) => Self::Unavailable(e),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

fn retry_after(secs: u64) -> [(axum::http::HeaderName, HeaderValue); 1] {
    [(RETRY_AFTER, HeaderValue::from(secs))]
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(e) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
            }
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            Self::Blocked {
                reason,
                retry_after_secs,
            } => (
                StatusCode::FORBIDDEN,
                retry_after(retry_after_secs),
                Json(json!({
                    "error": "Forbidden",
                    "message": "Your address has been temporarily blocked due to abusive behavior",
                    "reason": reason,
                    "retry_after_secs": retry_after_secs,
                })),
            )
                .into_response(),
            Self::RateLimited(decision) => (
                StatusCode::TOO_MANY_REQUESTS,
                retry_after(decision.retry_after_secs),
                Json(json!({
                    "error": "Rate limit exceeded",
                    "message": format!("Limit of {} per 1 minute exceeded", decision.limit),
                })),
            )
                .into_response(),
            Self::Unavailable(e) => {
                let retry = if e.is_transient() {
                    Some(retry_after(OVERLOAD_RETRY_SECS))
                } else {
                    None
                };
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    retry,
                    Json(json!({
                        "error": "Service temporarily unavailable",
                        "message": e.to_string(),
                    })),
                )
                    .into_response()
            }
            Self::Internal(detail) => {
                error!(error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}
