//! Configuration management for snowshare
//!
//! Handles loading configuration from ~/.config/snowshare/config.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::warehouse::default_db_path;

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Application name for config directory
const APP_NAME: &str = "snowshare";

/// Account locator used when none is configured
pub const DEFAULT_ACCOUNT: &str = "local";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Account locator the warehouse prefixes share names with
    #[serde(default)]
    pub account: Option<String>,

    /// Path to the emulated warehouse database
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Role reported as owner of created shares
    #[serde(default)]
    pub owner: Option<String>,

    /// Log file path; stderr only when unset
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the config file path
    ///
    /// Returns ~/.config/snowshare/config.toml on Linux
    pub fn config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Load configuration from the default location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file
    ///
    /// Returns default config if file doesn't exist
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Check if any configuration is set
    pub fn is_empty(&self) -> bool {
        self.account.is_none()
            && self.database_path.is_none()
            && self.owner.is_none()
            && self.log_file.is_none()
    }

    /// Get effective account locator (from config or default)
    pub fn effective_account(&self) -> &str {
        self.account.as_deref().unwrap_or(DEFAULT_ACCOUNT)
    }

    /// Get effective database path (from config or default)
    pub fn effective_database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(default_db_path)
    }
}

/// Format the configuration for display
pub fn format_config(config: &Config) -> String {
    let mut lines = Vec::new();

    lines.push("Current configuration:".to_string());
    lines.push(String::new());

    if let Some(ref account) = config.account {
        lines.push(format!("  account = \"{}\"", account));
    } else {
        lines.push(format!("  account = (not set, using {})", DEFAULT_ACCOUNT));
    }

    if let Some(ref path) = config.database_path {
        lines.push(format!("  database_path = \"{}\"", path.display()));
    } else {
        lines.push(format!(
            "  database_path = (not set, using {})",
            default_db_path().display()
        ));
    }

    if let Some(ref owner) = config.owner {
        lines.push(format!("  owner = \"{}\"", owner));
    } else {
        lines.push("  owner = (not set)".to_string());
    }

    if let Some(ref log_file) = config.log_file {
        lines.push(format!("  log_file = \"{}\"", log_file));
    } else {
        lines.push("  log_file = (not set)".to_string());
    }

    lines.join("\n")
}
