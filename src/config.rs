//! Configuration file handling.
//!
//! This module provides loading of lockscan configuration from a TOML
//! file. Command line flags always win over file values; the file only
//! supplies defaults.
//!
//! # Configuration Location
//!
//! The configuration file is read from:
//! - Linux: `~/.config/lockscan/config.toml`
//! - macOS: `~/Library/Application Support/lockscan/config.toml`
//! - Windows: `%APPDATA%\lockscan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! database = "/srv/security/infected.txt"
//! exclude = "node_modules|dist"
//! no_color = false
//! no_emoji = true
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persistent defaults for scan invocations.
///
/// A missing config file is not an error; every field falls back to
/// its default. A present but unreadable file is reported as an error
/// so the caller can decide whether to degrade to defaults.
///
/// # Example
///
/// ```no_run
/// use lockscan::Config;
///
/// let config = Config::load().unwrap();
/// if let Some(database) = &config.database {
///     println!("Default database: {}", database.display());
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database path used when `--database` is not given.
    pub database: Option<PathBuf>,

    /// Exclude pattern used when `--exclude` is not given.
    pub exclude: Option<String>,

    /// Disable colored output by default.
    pub no_color: bool,

    /// Disable emoji output by default.
    pub no_emoji: bool,
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read
    /// or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use lockscan::Config;
    ///
    /// let path = Config::config_path();
    /// println!("Config file: {}", path.display());
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lockscan")
            .join("config.toml")
    }
}
