//! Route table and the blocking-work bridge shared by handlers.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;

use super::{admin, guard, warrior, ApiError};
use crate::error::Result;
use crate::infrastructure::bootstrap::AppContext;

/// Assemble the full router.
pub fn build_router(ctx: AppContext) -> Router {
    let tracked = Router::new()
        .route("/warrior", post(warrior::create).get(warrior::search))
        .route("/warrior/{id}", get(warrior::get))
        .route("/counting-warriors", get(warrior::count))
        .fallback(warrior::not_found)
        .layer(from_fn_with_state(ctx.clone(), guard::abuse_guard));

    let mut exempt = Router::new()
        .route("/health", get(admin::health))
        .route("/health/ready", get(admin::ready));

    if ctx.config().server.admin_enabled {
        exempt = exempt
            .route("/admin/stats", get(admin::stats))
            .route("/admin/clients/{client}", get(admin::client_status))
            .route(
                "/admin/clients/{client}/block",
                post(admin::block).delete(admin::unblock),
            )
            .route(
                "/admin/whitelist/{client}",
                put(admin::whitelist).delete(admin::remove_from_whitelist),
            );
    }

    tracked.merge(exempt).with_state(ctx)
}

/// Run blocking store work off the async runtime.
pub(super) async fn run_blocking<T, F>(work: F) -> std::result::Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
        .map_err(ApiError::from)
}
