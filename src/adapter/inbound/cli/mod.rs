//! Command-line entry points.

pub mod check;
pub mod command;
pub mod migrate;
pub mod output;
pub mod serve;

use std::path::Path;

use tracing::warn;

use self::command::{Cli, Commands};
use crate::error::Result;
use crate::infrastructure::config::Config;

/// Dispatch a parsed command line.
///
/// # Errors
/// Returns the error of the executed command.
pub async fn execute(cli: Cli) -> Result<()> {
    output::configure(output::OutputConfig::new(cli.json, cli.quiet));

    match cli.command {
        Commands::Serve(args) => serve::execute(&args.config).await,
        Commands::Check(args) => check::execute(&args.config),
        Commands::Migrate(args) => migrate::execute(&args.config),
    }
}

/// Load the configuration file, falling back to defaults when it is absent.
pub(crate) fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        return Config::load(path);
    }
    warn!(path = %path.display(), "Config file not found, using defaults");
    Config::parse_toml("")
}
