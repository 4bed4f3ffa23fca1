//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// spanage - converge a database to a declared schema
#[derive(Parser, Debug)]
#[command(name = "spanage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override config file path (default: ./spanage.yml if present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Database path, overrides the config file (":memory:" for a scratch database)
    #[arg(short, long, global = true, env = "SPANAGE_DATABASE")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply a declared schema and record it in the ledger
    #[command(alias = "srl")]
    Update(UpdateArgs),

    /// Show the statements `update` would submit, without applying them
    Plan(PlanArgs),

    /// List recorded schema versions, newest first
    History(HistoryArgs),
}

/// Arguments for the update command
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Declared schema file (JSON); defaults to `schema_file` from the config
    pub schema_file: Option<PathBuf>,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Declared schema file (JSON); defaults to `schema_file` from the config
    pub schema_file: Option<PathBuf>,
}

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Show at most this many versions
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
