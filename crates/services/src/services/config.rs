//! Client configuration: defaults, optional TOML file, then environment overrides.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Suggestion calls wait on the AI provider and get a longer budget
    pub suggestion_timeout_secs: u64,
    pub search_debounce_ms: u64,
    pub search_min_query_len: usize,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            request_timeout_secs: 15,
            suggestion_timeout_secs: 45,
            search_debounce_ms: 300,
            search_min_query_len: 2,
            user_agent: concat!("plant-planner/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// `$XDG_CONFIG_HOME/plant-planner/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("plant-planner").join("config.toml"))
    }

    /// Load from `path` (missing file means defaults), then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => {
                let mut config = Self::from_file(path)?;
                config.apply_env(|name| std::env::var(name).ok())?;
                Ok(config)
            }
            Some(path) => {
                debug!(path = %path.display(), "config file not found, using defaults");
                Self::from_env()
            }
            None => Self::from_env(),
        }
    }

    /// Defaults overridden by `PLANT_PLANNER_*` variables.

    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(base_url) = var("PLANT_PLANNER_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(value) = var("PLANT_PLANNER_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("PLANT_PLANNER_TIMEOUT_SECS", value)?;
        }
        if let Some(value) = var("PLANT_PLANNER_SUGGESTION_TIMEOUT_SECS") {
            self.suggestion_timeout_secs =
                parse_env("PLANT_PLANNER_SUGGESTION_TIMEOUT_SECS", value)?;
        }
        if let Some(value) = var("PLANT_PLANNER_SEARCH_DEBOUNCE_MS") {
            self.search_debounce_ms = parse_env("PLANT_PLANNER_SEARCH_DEBOUNCE_MS", value)?;
        }
        if let Some(value) = var("PLANT_PLANNER_SEARCH_MIN_QUERY_LEN") {
            self.search_min_query_len = parse_env("PLANT_PLANNER_SEARCH_MIN_QUERY_LEN", value)?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn suggestion_timeout(&self) -> Duration {
        Duration::from_secs(self.suggestion_timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}
