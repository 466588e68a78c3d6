//! Configuration loading and validation for chatloop.
//!
//! Loads `~/.chatloop/config.toml` (defaults when absent), validates it, then
//! applies environment variable overrides. The API key normally comes from
//! the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables consulted for the API key, highest priority first.
pub const API_KEY_VARS: [&str; 2] = ["CHATLOOP_API_KEY", "OPENAI_API_KEY"];

/// The root configuration structure.
///
/// Maps directly to `~/.chatloop/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model that chats with the user
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Cap on tokens per response (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_tokens: Option<u32>,

    /// Rolling summary buffer settings
    #[serde(default)]
    pub memory: MemoryConfig,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_temperature() -> f32 {
    0.7
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("memory", &self.memory)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Raw history above this many estimated tokens gets summarized
    #[serde(default = "default_max_token_limit")]
    pub max_token_limit: usize,

    /// Model that rewrites overflow into a summary
    #[serde(default = "default_summary_model")]
    pub summary_model: String,

    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,
}

fn default_max_token_limit() -> usize {
    100
}
fn default_summary_model() -> String {
    "gpt-4o-mini".into()
}
fn default_summary_temperature() -> f32 {
    0.2
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_token_limit: default_max_token_limit(),
            summary_model: default_summary_model(),
            summary_temperature: default_summary_temperature(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.chatloop/config.toml),
    /// then apply environment overrides:
    /// - `CHATLOOP_API_KEY`, then `OPENAI_API_KEY` (only when the file has no key)
    /// - `CHATLOOP_MODEL`
    /// - `CHATLOOP_BASE_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
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

    /// Apply overrides from an environment lookup. Empty values count as unset.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = API_KEY_VARS.iter().find_map(|key| get(*key));
        }

        if let Some(model) = get("CHATLOOP_MODEL") {
            self.default_model = model;
        }

        if let Some(url) = get("CHATLOOP_BASE_URL") {
            self.base_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".chatloop")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.memory.summary_temperature) {
            return Err(ConfigError::ValidationError(
                "memory.summary_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.memory.max_token_limit == 0 {
            return Err(ConfigError::ValidationError(
                "memory.max_token_limit must be > 0".into(),
            ));
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: None,
            memory: MemoryConfig::default(),
        }
    }
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
