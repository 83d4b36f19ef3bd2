//! Warrior record routes.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiError;
use super::router::run_blocking;
use crate::domain::warrior::DEFAULT_SEARCH_LIMIT;
use crate::domain::{NewWarrior, WarriorId};
use crate::error::ValidationError;
use crate::infrastructure::bootstrap::AppContext;

const NOT_FOUND: &str = "Warrior not found";
const MISSING_TERM: &str = "Query parameter 't' (search term) is required";

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    t: Option<String>,
}

/// `POST /warrior`
pub async fn create(State(ctx): State<AppContext>, body: Bytes) -> Result<Response, ApiError> {
    let body: Value = serde_json::from_slice(&body).map_err(|_| ValidationError::NotJson)?;
    let new = NewWarrior::from_json(&body)?;

    let store = Arc::clone(ctx.store());
    let record = run_blocking(move || store.create(new)).await?;

    let location = format!("/warrior/{}", record.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(record)).into_response())
}

/// `GET /warrior/{id}`
pub async fn get(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let Some(id) = WarriorId::parse(&id) else {
        return Err(ApiError::NotFound(NOT_FOUND));
    };

    let store = Arc::clone(ctx.store());
    match run_blocking(move || store.get(&id)).await? {
        Some(record) => Ok(Json(record).into_response()),
        None => Err(ApiError::NotFound(NOT_FOUND)),
    }
}

/// `GET /warrior?t=term`
pub async fn search(
    State(ctx): State<AppContext>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    let term = params
        .t
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::BadRequest(MISSING_TERM))?;

    let store = Arc::clone(ctx.store());
    let records = run_blocking(move || store.search(&term, DEFAULT_SEARCH_LIMIT)).await?;
    Ok(Json(records).into_response())
}

/// `GET /counting-warriors`
pub async fn count(State(ctx): State<AppContext>) -> Result<Response, ApiError> {
    let store = Arc::clone(ctx.store());
    let count = run_blocking(move || store.count()).await?;
    Ok(Json(json!({ "count": count })).into_response())
}

/// Catch-all for unknown paths on the tracked router.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" }))).into_response()
}
