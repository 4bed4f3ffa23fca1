//! Shared utilities for CLI commands

use anyhow::{bail, Context, Result};
use spanage_core::{Config, SchemaDdl};
use spanage_db::DuckDbBackend;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Load `--config`, or `spanage.yml` from the working directory when present.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    match &global.config {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path)),
        None => Config::load_from_dir(Path::new(".")).context("Failed to load spanage.yml"),
    }
}

/// Database path: `--database` / `SPANAGE_DATABASE`, then the config file.
pub(crate) fn database_path(global: &GlobalArgs, config: &Config) -> String {
    global
        .database
        .clone()
        .unwrap_or_else(|| config.database.path.clone())
}

/// Open the DuckDB database the command operates on.
pub(crate) fn open_database(global: &GlobalArgs, config: &Config) -> Result<DuckDbBackend> {
    let path = database_path(global, config);
    log::debug!("Opening database {}", path);
    DuckDbBackend::new(&path).with_context(|| format!("Failed to open database {}", path))
}

/// Schema file from the command line, falling back to `schema_file` in the
/// config.
pub(crate) fn resolve_schema_file(arg: Option<&Path>, config: &Config) -> Result<PathBuf> {
    match arg.map(Path::to_path_buf).or_else(|| config.schema_file.clone()) {
        Some(path) => Ok(path),
        None => bail!("No schema file given: pass one or set schema_file in spanage.yml"),
    }
}

/// Load and validate a declared schema file.
pub(crate) fn load_schema(path: &Path) -> Result<SchemaDdl> {
    SchemaDdl::load(path).with_context(|| format!("Failed to load schema {}", path.display()))
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
