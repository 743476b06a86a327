//! Configuration file handling.
//!
//! The configuration file is stored at `$BUDGET_HOME/config.json` and says where the data
//! documents live and which storage backend to prefer.

use crate::store::{self, BackendPreference, Storage};
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "budget-tracker";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const DATA_DIR: &str = "data";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$BUDGET_HOME` and from there it loads `$BUDGET_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    data_dir: PathBuf,
}

impl Config {
    /// Creates the home directory, the data directory and an initial `config.json` with default
    /// settings. An existing `config.json` is left as it is and loaded instead.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::create_dir_all(&maybe_relative)
            .context("Unable to create the budget home directory")?;
        let root = canonicalize(&maybe_relative)?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.is_file() {
            return Self::load(root);
        }
        let config_file = ConfigFile::default();
        config_file.save(&config_path)?;

        let data_dir = config_file.resolve_data_dir(&root);
        utils::create_dir_all(&data_dir)?;
        Ok(Self {
            root,
            config_path,
            config_file,
            data_dir,
        })
    }

    /// This will
    /// - validate that `budget_home` exists and that the config file exists
    /// - load the config file
    /// - return the loaded configuration object
    pub fn load(budget_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = budget_home.into();
        if !maybe_relative.is_dir() {
            bail!(
                "Budget home is missing '{}', run `budget init` first",
                maybe_relative.display()
            )
        }
        let root = canonicalize(&maybe_relative)?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path)?;
        let data_dir = config_file.resolve_data_dir(&root);
        Ok(Self {
            root,
            config_path,
            config_file,
            data_dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Where the category, transaction and budget documents live.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backend(&self) -> BackendPreference {
        self.config_file.backend
    }

    /// Opens the store, letting `preference` override the configured backend.
    pub fn open_store(&self, preference: Option<BackendPreference>) -> Result<Box<dyn Storage>> {
        store::open(&self.data_dir, preference.unwrap_or(self.backend()))
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("Unable to canonicalize the path {}", path.to_string_lossy()))
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "budget-tracker",
///   "config_version": 1,
///   "data_dir": "data",
///   "backend": "auto"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "budget-tracker"
    app_name: String,

    config_version: u8,

    /// Relative to `$BUDGET_HOME` unless absolute
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,

    #[serde(default)]
    backend: BackendPreference,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DATA_DIR)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            data_dir: default_data_dir(),
            backend: BackendPreference::default(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    fn load(path: &Path) -> Result<Self> {
        let config: ConfigFile = utils::deserialize(path)?;
        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        Ok(config)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data).context("Unable to write config file")
    }

    fn resolve_data_dir(&self, root: &Path) -> PathBuf {
        if self.data_dir.is_absolute() {
            return self.data_dir.clone();
        }
        root.join(&self.data_dir)
    }
}
