//! Configuration management for DeskScout
//!
//! Tunables live in a TOML file, by default `<config dir>/deskscout/config.toml`.
//! Every key is optional; missing keys take the built-in defaults.

use crate::{DeskScoutError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Engine tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Freshness window for the cached window list
    pub window_cache_ttl_ms: u64,
    /// Freshness window for the cached workspace list
    pub workspace_cache_ttl_ms: u64,
    /// Upper bound on cached windows; invisible windows are evicted first
    pub max_cached_windows: usize,
    /// Budget for a single handle validation
    pub validation_timeout_ms: u64,
    /// Focus requests accepted per rate-limit window
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_ms: u64,
    /// Finished focus operations kept for inspection
    pub focus_history_size: usize,
    /// Memoized filter results kept before the oldest is dropped
    pub filter_cache_capacity: usize,
    pub caching_enabled: bool,
    /// Workspace enumerations slower than this are logged as warnings
    pub workspace_enumeration_warning_ms: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            window_cache_ttl_ms: 5_000,
            workspace_cache_ttl_ms: 10_000,
            max_cached_windows: 10_000,
            validation_timeout_ms: 500,
            rate_limit_max_requests: 10,
            rate_limit_window_ms: 1_000,
            focus_history_size: 1_000,
            filter_cache_capacity: 256,
            caching_enabled: true,
            workspace_enumeration_warning_ms: 1_000,
        }
    }
}

impl ManagerConfig {
    pub fn window_ttl(&self) -> Duration {
        Duration::from_millis(self.window_cache_ttl_ms)
    }

    pub fn workspace_ttl(&self) -> Duration {
        Duration::from_millis(self.workspace_cache_ttl_ms)
    }

    pub fn validation_timeout(&self) -> Duration {
        Duration::from_millis(self.validation_timeout_ms)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    pub fn workspace_enumeration_warning(&self) -> Duration {
        Duration::from_millis(self.workspace_enumeration_warning_ms)
    }

    /// `<config dir>/deskscout/config.toml`, falling back to the working directory
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("deskscout")
            .join("config.toml")
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load from `path` (or the default location); a missing file yields defaults
    pub fn load_or_default(path: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn save(&self, path: &Path) -> std::result::Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(self)?;

        // Atomic write
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(temp_path, path)?;
        Ok(())
    }

    /// Reject values that would disable a bound the engine relies on
    pub fn validate(&self) -> Result<()> {
        let checks: [(&str, bool); 7] = [
            ("window_cache_ttl_ms", self.window_cache_ttl_ms > 0),
            ("workspace_cache_ttl_ms", self.workspace_cache_ttl_ms > 0),
            ("max_cached_windows", self.max_cached_windows > 0),
            ("validation_timeout_ms", self.validation_timeout_ms > 0),
            ("rate_limit_max_requests", self.rate_limit_max_requests > 0),
            ("rate_limit_window_ms", self.rate_limit_window_ms > 0),
            ("focus_history_size", self.focus_history_size > 0),
        ];

        for (parameter, ok) in checks {
            if !ok {
                return Err(DeskScoutError::Configuration {
                    parameter: parameter.to_string(),
                    issue: "must be greater than zero".to_string(),
                }
                .into());
            }
        }

        if self.filter_cache_capacity == 0 && self.caching_enabled {
            return Err(DeskScoutError::Configuration {
                parameter: "filter_cache_capacity".to_string(),
                issue: "must be greater than zero while caching is enabled".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
