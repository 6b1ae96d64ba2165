//! Application context for the Chatlock CLI.
//!
//! Provides a unified context that combines CLI arguments with the
//! lazily-loaded config file.

use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;
use tracing::debug;

use chatlock_core::view::DocumentView;
use chatlock_core::SqliteStore;

use crate::cli::Cli;
use crate::config::{read_config, ChatlockConfig};
use crate::ui::UiContext;

use super::resolver::{missing_view, resolve_config_path, resolve_store_path};

/// Application context that bundles CLI args with configuration.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<ChatlockConfig>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    /// Get the CLI arguments.
    pub fn cli(&self) -> &Cli {
        self.cli
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// The effective configuration.
    ///
    /// A missing config file is not an error; defaults apply and the store
    /// path resolves through `--store` or the XDG data directory.
    pub fn config(&self) -> anyhow::Result<&ChatlockConfig> {
        self.config.get_or_try_init(|| {
            let path = resolve_config_path(self.cli)?;
            if path.exists() {
                debug!(path = %path.display(), "loading config");
                let mut config = read_config(&path)?;
                config.store.path = resolve_store_path(self.cli, Some(&config))?
                    .to_string_lossy()
                    .to_string();
                Ok(config)
            } else {
                Ok(ChatlockConfig::new(resolve_store_path(self.cli, None)?))
            }
        })
    }

    /// Path of the vault database.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        Ok(PathBuf::from(&self.config()?.store.path))
    }

    /// Open the vault database, creating it if needed.
    pub fn open_store(&self) -> anyhow::Result<SqliteStore> {
        let path = self.store_path()?;
        debug!(path = %path.display(), "opening vault store");
        Ok(SqliteStore::open(&path)?)
    }

    /// Load the view document at `path`.
    pub fn open_view(&self, path: &Path) -> anyhow::Result<DocumentView> {
        if !path.exists() {
            return Err(missing_view(path).into());
        }
        Ok(DocumentView::open(path)?)
    }

    /// UI context for this invocation.
    pub fn ui_context(&self, json: bool) -> UiContext {
        UiContext::from_env(json, self.cli.no_color, self.cli.ascii)
    }
}
