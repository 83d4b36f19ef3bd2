//! HTTP listener lifecycle.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;

use super::router::build_router;
use crate::error::Result;
use crate::infrastructure::bootstrap::AppContext;

/// Bind the configured address and serve until `shutdown` resolves.
///
/// # Errors
/// Returns an error if the address is invalid, cannot be bound, or the
/// server fails while running.
pub async fn serve<F>(ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = ctx.config().bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "HTTP server listening");

    let app = build_router(ctx);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    info!("HTTP server stopped");
    Ok(())
}
