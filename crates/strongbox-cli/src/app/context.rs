//! Application context for the Strongbox CLI.
//!
//! Combines CLI arguments with the lazily-loaded config file and the
//! store directory.

use std::io::IsTerminal;
use std::path::PathBuf;

use once_cell::unsync::OnceCell;

use strongbox_core::{Database, EncryptedDatabase, StoreDirectory};

use crate::cli::Cli;
use crate::config::{read_config, StrongboxConfig};

use super::passphrase::unlock_with_retry;
use super::resolver::{find_store, resolve_config_path, resolve_store_dir};

/// Application context that bundles CLI args with configuration.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<Option<StrongboxConfig>>,
    stores: OnceCell<StoreDirectory>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
            stores: OnceCell::new(),
        }
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Prompts are allowed only on a terminal without `--no-input`.
    pub fn interactive(&self) -> bool {
        std::io::stdin().is_terminal() && !self.cli.no_input
    }

    /// The config file, if one exists. Loaded once.
    pub fn config(&self) -> anyhow::Result<Option<&StrongboxConfig>> {
        let config = self.config.get_or_try_init(|| -> anyhow::Result<_> {
            let path = resolve_config_path()?;
            if !path.exists() {
                return Ok(None);
            }
            read_config(&path).map(Some)
        })?;
        Ok(config.as_ref())
    }

    pub fn store_dir(&self) -> anyhow::Result<PathBuf> {
        resolve_store_dir(self.cli, self.config()?)
    }

    /// Open the store directory. Opened once.
    pub fn stores(&self) -> anyhow::Result<&StoreDirectory> {
        self.stores.get_or_try_init(|| -> anyhow::Result<StoreDirectory> {
            let dir = self.store_dir()?;
            tracing::debug!(dir = %dir.display(), "opening store directory");
            Ok(StoreDirectory::open(&dir)?)
        })
    }

    /// Load the locked store matching a name, id, or id prefix.
    pub fn find_store(&self, selector: &str) -> anyhow::Result<EncryptedDatabase> {
        let all = self.stores()?.load_all()?;
        Ok(find_store(&all, selector)?.clone())
    }

    /// Find a store and unlock it with the user's password.
    pub fn unlock(&self, selector: &str) -> anyhow::Result<Database> {
        let store = self.find_store(selector)?;
        unlock_with_retry(&store, self.interactive())
    }
}
