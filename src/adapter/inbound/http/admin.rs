//! Operator routes: service stats, client inspection, manual overrides.
//!
//! Mounted outside the abuse guard, so operator traffic is never tracked.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::error::ApiError;
use super::router::run_blocking;
use crate::domain::ClientId;
use crate::error::ValidationError;
use crate::infrastructure::bootstrap::AppContext;

#[derive(Debug, Default, Deserialize)]
pub struct BlockRequest {
    duration_secs: Option<u64>,
}

/// `GET /health`
pub async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

/// `GET /health/ready`
pub async fn ready(State(ctx): State<AppContext>) -> Result<Response, ApiError> {
    let report = run_blocking(move || Ok(ctx.readiness())).await?;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((status, Json(report)).into_response())
}

/// `GET /admin/stats`
pub async fn stats(State(ctx): State<AppContext>) -> Response {
    Json(ctx.stats()).into_response()
}

/// `GET /admin/clients/{client}`
pub async fn client_status(
    State(ctx): State<AppContext>,
    Path(client): Path<String>,
) -> Response {
    Json(ctx.detector().status(&ClientId::new(client))).into_response()
}

/// `POST /admin/clients/{client}/block`
///
/// The body is optional; without `duration_secs` the configured block
/// duration applies.
pub async fn block(
    State(ctx): State<AppContext>,
    Path(client): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: BlockRequest = if body.is_empty() {
        BlockRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|_| ValidationError::NotJson)?
    };

    let client = ClientId::new(client);
    let duration = ctx
        .detector()
        .manually_block(&client, request.duration_secs.map(Duration::from_secs));
    Ok(Json(json!({
        "client": client,
        "blocked": true,
        "duration_secs": duration.as_secs(),
    }))
    .into_response())
}

/// `DELETE /admin/clients/{client}/block`
pub async fn unblock(State(ctx): State<AppContext>, Path(client): Path<String>) -> Response {
    let client = ClientId::new(client);
    let unblocked = ctx.detector().manually_unblock(&client);
    Json(json!({ "client": client, "unblocked": unblocked })).into_response()
}

/// `PUT /admin/whitelist/{client}`
pub async fn whitelist(State(ctx): State<AppContext>, Path(client): Path<String>) -> Response {
    let client = ClientId::new(client);
    ctx.detector().whitelist(&client);
    Json(json!({ "client": client, "whitelisted": true })).into_response()
}

/// `DELETE /admin/whitelist/{client}`
pub async fn remove_from_whitelist(
    State(ctx): State<AppContext>,
    Path(client): Path<String>,
) -> Response {
    let client = ClientId::new(client);
    let removed = ctx.detector().remove_from_whitelist(&client);
    Json(json!({ "client": client, "removed": removed })).into_response()
}
