//! Handler for the `migrate` command.

use std::path::Path;

use super::{load_config, output};
use crate::error::Result;
use crate::infrastructure::bootstrap::AppContext;

/// Apply pending migrations and exit.
///
/// # Errors
/// Returns an error if the configuration is invalid, no connection can be
/// opened, or a migration fails.
pub fn execute(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    config.init_logging();

    let ctx = AppContext::build(config)?;
    let result = ctx.migrate();
    ctx.shutdown();
    result?;

    output::success(&format!("Database at {} is up to date", ctx.config().database.url));
    Ok(())
}
