//! Handler for the `serve` command.

use std::path::Path;

use tokio::signal;
use tracing::{info, warn};

use super::{load_config, output};
use crate::adapter::inbound::http;
use crate::error::Result;
use crate::infrastructure::bootstrap::AppContext;
use crate::infrastructure::config::Config;

/// Migrate, then serve HTTP until Ctrl-C.
///
/// # Errors
/// Returns an error if start-up fails or the server stops abnormally.
pub async fn execute(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    config.init_logging();

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Listen", &config.server.bind);
    output::field("Database", &config.database.url);
    output::field(
        "Pool",
        format!(
            "{} initial / {} max",
            config.pool.initial_size, config.pool.max_connections
        ),
    );
    output::field("Abuse detection", enabled_label(config.abuse.enabled));
    output::field("Rate limit", rate_limit_label(&config));

    let ctx = AppContext::build(config)?;
    ctx.migrate()?;

    let result = http::serve(ctx.clone(), shutdown_signal()).await;
    ctx.shutdown();
    info!("warband stopped");
    result
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        return;
    }
    info!("Shutdown signal received");
}

fn enabled_label(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

fn rate_limit_label(config: &Config) -> String {
    if config.rate_limit.enabled {
        format!("{} per minute", config.rate_limit.requests_per_minute)
    } else {
        enabled_label(false).to_string()
    }
}
