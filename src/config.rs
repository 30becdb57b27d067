//! Configuration file handling for the ledger.
//!
//! The configuration file is stored at `$LEDGER_HOME/config.json` and says where the purchase and
//! expense collections are found and how the ledger view is printed by default.

use crate::commands::OutputFormat;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "ledger";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const PURCHASES_JSON: &str = "purchases.json";
const EXPENSES_JSON: &str = "expenses.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$LEDGER_HOME` and from there it loads `$LEDGER_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, if needed, and writes an initial `config.json` with default
    /// settings.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    /// - Returns an error if a config file already exists.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the ledger home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            )
        }
        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that `ledger_home` exists and that the config file exists
    /// - load the config file
    /// - return the loaded configuration object
    pub async fn load(ledger_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = ledger_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Ledger Home is missing")?;
        if !root.is_dir() {
            bail!("Ledger Home is not a directory '{}'", root.display())
        }

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The purchases collection. Relative paths are resolved against the home directory.
    pub fn purchases_path(&self) -> PathBuf {
        self.resolve(self.config_file.purchases_path())
    }

    /// The expenses collection. Relative paths are resolved against the home directory.
    pub fn expenses_path(&self) -> PathBuf {
        self.resolve(self.config_file.expenses_path())
    }

    pub fn output_format(&self) -> OutputFormat {
        self.config_file.output_format
    }

    fn resolve(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "ledger",
///   "config_version": 1,
///   "purchases_path": "data/purchases.json",
///   "expenses_path": "/srv/exports/expenses.json",
///   "output_format": "table"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "ledger"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Path to the purchases JSON array (optional, relative to the home directory or absolute)
    /// Defaults to $LEDGER_HOME/purchases.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    purchases_path: Option<PathBuf>,

    /// Path to the expenses JSON array (optional, relative to the home directory or absolute)
    /// Defaults to $LEDGER_HOME/expenses.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expenses_path: Option<PathBuf>,

    /// How `ledger view` prints when no --format is given
    #[serde(default)]
    output_format: OutputFormat,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            purchases_path: None,
            expenses_path: None,
            output_format: OutputFormat::default(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or names another app.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .context("Unable to load the config file")?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    pub fn purchases_path(&self) -> PathBuf {
        self.purchases_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(PURCHASES_JSON))
    }

    pub fn expenses_path(&self) -> PathBuf {
        self.expenses_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(EXPENSES_JSON))
    }
}
