//! Abuse and rate-limit middleware for the tracked routes.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::client::client_id;
use super::error::ApiError;
use crate::infrastructure::abuse::RateDecision;
use crate::infrastructure::bootstrap::AppContext;

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Gate one request through the detector and the rate limiter.
///
/// Blocked clients are rejected without touching their metrics. Everything
/// else, including `429` rejections, is recorded with its final status.
pub async fn abuse_guard(State(ctx): State<AppContext>, request: Request, next: Next) -> Response {
    let client = client_id(&request, ctx.config().server.trust_forwarded_for);

    if let Some(block) = ctx.detector().block_info(&client) {
        debug!(client = %client, reason = %block.reason, "Rejected blocked client");
        return ApiError::Blocked {
            reason: block.reason,
            retry_after_secs: block.retry_after_secs(),
        }
        .into_response();
    }

    let decision = ctx
        .config()
        .rate_limit
        .enabled
        .then(|| ctx.limiter().check(&client));

    let mut response = match decision {
        Some(decision) if !decision.allowed => {
            debug!(client = %client, limit = decision.limit, "Rate limit exceeded");
            ApiError::RateLimited(decision).into_response()
        }
        _ => next.run(request).await,
    };

    if let Some(decision) = decision {
        set_rate_headers(response.headers_mut(), &decision);
    }

    ctx.detector()
        .record_request(&client, response.status().as_u16());
    response
}

fn set_rate_headers(headers: &mut HeaderMap, decision: &RateDecision) {
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(RATE_LIMIT_RESET, HeaderValue::from(decision.reset_at));
}
