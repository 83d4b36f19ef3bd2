//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Warrior registry service
#[derive(Parser, Debug)]
#[command(name = "warband")]
#[command(version)]
pub struct Cli {
    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service until interrupted
    Serve(ConfigArgs),

    /// Probe the database through the pool and report health
    Check(ConfigArgs),

    /// Apply pending database migrations
    Migrate(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}
