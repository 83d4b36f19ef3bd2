//! Handler for the `check` command.

use std::path::Path;

use serde_json::json;

use super::{load_config, output};
use crate::error::{Error, Result};
use crate::infrastructure::bootstrap::AppContext;
use crate::infrastructure::health::HealthStatus;

/// Build the pool, probe the database and print the report.
///
/// # Errors
/// Returns an error if the configuration is invalid or any critical check
/// fails.
pub fn execute(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let ctx = AppContext::build(config)?;
    let report = ctx.readiness();
    ctx.shutdown();

    if output::is_json() {
        output::json_output(json!({
            "command": "check",
            "status": if report.is_healthy() { "healthy" } else { "unhealthy" },
            "report": report,
        }));
    } else {
        output::section("Health Check");
        for check in report.checks() {
            let suffix = if check.critical() { " (critical)" } else { "" };
            let value = match check.status() {
                HealthStatus::Healthy => "healthy".to_string(),
                HealthStatus::Unhealthy(reason) => format!("unhealthy: {reason}"),
            };
            output::field(&format!("{}{suffix}", check.name()), value);
        }
        let pool = report.pool();
        output::field("connections", format!("{} live / {} max", pool.live, pool.max_connections));
    }

    if !report.is_healthy() {
        output::error("Health check failed");
        return Err(Error::Connection("health check failed".to_string()));
    }
    output::success("Health check passed");
    Ok(())
}
