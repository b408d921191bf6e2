//! Configuration loading and validation for Switchyard.
//!
//! Loads configuration from `~/.switchyard/config.toml` with environment
//! variable overrides. Validates all settings at startup, before any
//! registry is built or any turn runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use switchyard_registry::PreferenceStore;

/// The root configuration structure.
///
/// Maps directly to `~/.switchyard/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Command names sessions may dispatch
    #[serde(default = "default_allowed_commands")]
    pub allowed_commands: Vec<String>,

    /// Preference flags, in priority order
    #[serde(default)]
    pub preference_flags: Vec<String>,

    /// Name of the no-op thinking command
    #[serde(default = "default_reasoning_command")]
    pub reasoning_command: String,

    /// Sub-agent delegation settings
    #[serde(default)]
    pub delegate: DelegateConfig,

    /// Persisted provider preferences:
    /// `[preferences.<operation>]` tables mapping flag to provider id
    #[serde(default)]
    pub preferences: HashMap<String, HashMap<String, String>>,
}

fn default_allowed_commands() -> Vec<String> {
    vec!["say".into(), "reasoning".into(), "finish".into()]
}
fn default_reasoning_command() -> String {
    "reasoning".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegateConfig {
    /// Round-trip budget for one sub-agent exchange
    #[serde(default = "default_exchange_timeout_secs")]
    pub exchange_timeout_secs: u64,
}

fn default_exchange_timeout_secs() -> u64 {
    120
}

impl Default for DelegateConfig {
    fn default() -> Self {
        Self {
            exchange_timeout_secs: default_exchange_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.switchyard/config.toml).
    ///
    /// Environment variable overrides, highest priority:
    /// - `SWITCHYARD_ALLOWED_COMMANDS` (comma-separated)
    /// - `SWITCHYARD_PREFERENCE_FLAGS` (comma-separated)
    /// - `SWITCHYARD_REASONING_COMMAND`
    /// - `SWITCHYARD_DELEGATE_TIMEOUT_SECS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(list) = std::env::var("SWITCHYARD_ALLOWED_COMMANDS") {
            config.allowed_commands = split_list(&list);
        }
        if let Ok(list) = std::env::var("SWITCHYARD_PREFERENCE_FLAGS") {
            config.preference_flags = split_list(&list);
        }
        if let Ok(name) = std::env::var("SWITCHYARD_REASONING_COMMAND") {
            config.reasoning_command = name;
        }
        if let Some(secs) = std::env::var("SWITCHYARD_DELEGATE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.delegate.exchange_timeout_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".switchyard")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_commands.is_empty() {
            return Err(ConfigError::ValidationError(
                "allowed_commands must not be empty: every command would be skipped".into(),
            ));
        }
        if self.reasoning_command.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "reasoning_command must not be blank".into(),
            ));
        }
        if self.delegate.exchange_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "delegate.exchange_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// The preference table as a read-only store for registry resolution.
    pub fn preference_store(&self) -> ConfigPreferences {
        ConfigPreferences {
            entries: self.preferences.clone(),
        }
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            allowed_commands: default_allowed_commands(),
            preference_flags: Vec::new(),
            reasoning_command: default_reasoning_command(),
            delegate: DelegateConfig::default(),
            preferences: HashMap::new(),
        }
    }
}

/// The persisted preference table, read by the registry during resolution.
pub struct ConfigPreferences {
    entries: HashMap<String, HashMap<String, String>>,
}

impl PreferenceStore for ConfigPreferences {
    fn lookup(&self, operation: &str, flag: &str) -> Option<String> {
        self.entries.get(operation)?.get(flag).cloned()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
