//! Configuration loading and management
//!
//! Handles parsing of `.herald.toml` configuration files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = ".herald.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Actor configuration
    #[serde(default)]
    pub actor: ActorConfig,

    /// User directory configuration
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Notification configuration
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            actor: ActorConfig::default(),
            directory: DirectoryConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `.herald.toml` in the given directory.
    ///
    /// A missing file yields the default configuration; a malformed file
    /// is an error so a typo never silently reverts a deployment to
    /// defaults.
    pub fn load_from_dir(dir: &Path) -> crate::error::Result<Config> {
        let path = dir.join(CONFIG_FILENAME);
        Self::load_from_path(&path)
    }

    /// Load configuration from an explicit path.
    pub fn load_from_path(path: &Path) -> crate::error::Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.directory.cache_capacity == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "directory.cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.notify.unknown_user.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "notify.unknown_user cannot be empty".to_string(),
            ));
        }
        if self.notify.unknown_entity.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "notify.unknown_entity cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Actor-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Default actor uid when none specified
    #[serde(default = "default_actor")]
    pub default: String,
}

fn default_actor() -> String {
    "unknown".to_string()
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            default: default_actor(),
        }
    }
}

/// User directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Bounded capacity of the display-name cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_cache_capacity() -> usize {
    256
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Notification composition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Placeholder used when a user id cannot be resolved
    #[serde(default = "default_unknown_user")]
    pub unknown_user: String,

    /// Placeholder used when a customer or deal is missing or unresolvable
    #[serde(default = "default_unknown_entity")]
    pub unknown_entity: String,

    /// Per-deployment status label overrides, e.g. `todo = "backlog"`.
    /// Statuses without an override use the built-in labels.
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

fn default_unknown_user() -> String {
    "an unknown user".to_string()
}

fn default_unknown_entity() -> String {
    "unknown".to_string()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            unknown_user: default_unknown_user(),
            unknown_entity: default_unknown_entity(),
            labels: HashMap::new(),
        }
    }
}

/// Resolve the working directory a command operates in.
pub fn resolve_base_dir(cli_dir: Option<&Path>) -> PathBuf {
    match cli_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
