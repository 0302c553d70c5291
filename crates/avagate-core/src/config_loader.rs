//! Configuration loader for the `avagate` transaction-safety gate.
//!
//! Handles reading and writing `~/.avagate/config.toml`, `~` expansion, and
//! falling back to defaults when no file exists.
//!
//! # Examples
//!
//! ```no_run
//! use avagate_core::config_loader::ConfigLoader;
//!
//! let loader = ConfigLoader::new().expect("failed to create loader");
//!
//! if loader.exists() {
//!     let config = loader.load().expect("failed to load config");
//!     println!("log level: {}", config.logging.level);
//! } else {
//!     loader.write_default().expect("failed to write default config");
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::ConfigError;

/// The default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// The default base directory name within the home directory.
const BASE_DIR_NAME: &str = ".avagate";

/// Reads and writes the configuration file.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Base directory for `avagate` files (default: ~/.avagate).
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a loader rooted at `~/.avagate`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDirectory`] if the home directory cannot be determined.
    pub fn new() -> Result<Self, ConfigError> {
        let base_dir = default_base_dir()?;
        Ok(Self { base_dir })
    }

    /// Creates a loader rooted at a custom directory.
    #[must_use]
    pub const fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Path of the configuration file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE_NAME)
    }

    /// The base directory.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Loads and validates the configuration, returning defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseFailed`] for invalid TOML,
    /// [`ConfigError::InvalidValue`] if validation fails, and
    /// [`ConfigError::Io`] if the file cannot be read.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            return Ok(Config::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Loads the configuration, failing if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if the file is missing, otherwise
    /// the same errors as [`load`](Self::load).
    pub fn load_required(&self) -> Result<Config, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            return Err(ConfigError::file_not_found(
                config_path.display().to_string(),
            ));
        }

        Self::load_from_path(&config_path)
    }

    /// Saves the configuration, creating the base directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] on write failure and
    /// [`ConfigError::ParseFailed`] if serialization fails.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        self.ensure_base_dir()?;

        let config_path = self.config_path();

        let toml_str = toml::to_string_pretty(config).map_err(|e| {
            ConfigError::parse_failed(format!("failed to serialize configuration: {e}"))
        })?;

        fs::write(&config_path, toml_str).map_err(|e| {
            ConfigError::io(
                format!("failed to write configuration to {}", config_path.display()),
                e,
            )
        })
    }

    /// Writes [`Config::default_toml`] to the configuration path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] on write failure.
    pub fn write_default(&self) -> Result<(), ConfigError> {
        self.ensure_base_dir()?;

        let config_path = self.config_path();

        fs::write(&config_path, Config::default_toml()).map_err(|e| {
            ConfigError::io(
                format!(
                    "failed to write default configuration to {}",
                    config_path.display()
                ),
                e,
            )
        })
    }

    /// Checks if the configuration file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.config_path().exists()
    }

    fn ensure_base_dir(&self) -> Result<(), ConfigError> {
        if !self.base_dir.exists() {
            fs::create_dir_all(&self.base_dir).map_err(|e| {
                ConfigError::io(
                    format!(
                        "failed to create base directory {}",
                        self.base_dir.display()
                    ),
                    e,
                )
            })?;
        }
        Ok(())
    }

    fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::io(format!("failed to read {}", path.display()), e))?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            ConfigError::parse_failed(format!("invalid TOML in {}: {e}", path.display()))
        })?;

        config.validate()?;

        Ok(config)
    }
}

/// Expands a leading `~` to the home directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDirectory`] if the path starts with `~` and
/// the home directory cannot be determined.
///
/// # Examples
///
/// ```
/// use avagate_core::config_loader::expand_path;
///
/// let path = expand_path("/etc/avagate/config.toml").expect("absolute path");
/// assert_eq!(path.to_string_lossy(), "/etc/avagate/config.toml");
/// ```
pub fn expand_path(path: &str) -> Result<PathBuf, ConfigError> {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(ConfigError::no_home_directory)?;
        Ok(home.join(rest))
    } else if path == "~" {
        dirs::home_dir().ok_or_else(ConfigError::no_home_directory)
    } else {
        Ok(PathBuf::from(path))
    }
}

/// Returns `~/.avagate`.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDirectory`] if the home directory cannot be determined.
pub fn default_base_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(ConfigError::no_home_directory)?;
    Ok(home.join(BASE_DIR_NAME))
}

/// Loads configuration from the default location, with defaults for a missing file.
///
/// # Errors
///
/// See [`ConfigLoader::new`] and [`ConfigLoader::load`].
pub fn load_config() -> Result<Config, ConfigError> {
    ConfigLoader::new()?.load()
}
