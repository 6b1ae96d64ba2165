//! Path resolution for config, vault and view files.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{default_config_path, default_store_path, ChatlockConfig};
use crate::errors::CliError;

/// Resolve the config file path; `--config` and `CHATLOCK_CONFIG` win.
pub fn resolve_config_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.config.as_ref() {
        if !path.as_os_str().is_empty() {
            return Ok(path.clone());
        }
    }
    default_config_path()
}

/// Resolve the vault database from CLI args, then config, then the default.
pub fn resolve_store_path(cli: &Cli, config: Option<&ChatlockConfig>) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.store.as_ref() {
        if !path.as_os_str().is_empty() {
            return Ok(path.clone());
        }
    }
    match config {
        Some(config) if !config.store.path.trim().is_empty() => {
            Ok(PathBuf::from(&config.store.path))
        }
        _ => default_store_path(),
    }
}

/// Error for a view document that does not exist.
pub fn missing_view(path: &Path) -> CliError {
    CliError::not_found(
        format!("No view document at {}", path.display()),
        "Hint: Pass --view with a JSON file holding `location` and `messages`.",
    )
}
