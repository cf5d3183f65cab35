//! Application configuration management.
//!
//! Configuration is stored at `~/.config/myndigheter/config.json`. Every
//! field is optional; the accessors fall back to built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_BASE_URL;
use crate::cache::DEFAULT_TTL_HOURS;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "myndigheter";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Upper bound on a configured TTL (ten years)
const MAX_TTL_HOURS: u64 = 24 * 365 * 10;

pub const ENV_BASE_URL: &str = "MYNDIGHETER_BASE_URL";
pub const ENV_CACHE_TTL_HOURS: &str = "MYNDIGHETER_CACHE_TTL_HOURS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_hours: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Overlay values from `lookup` (normally the process environment).
    /// Unparseable TTLs are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|s| !s.trim().is_empty()) {
            self.base_url = Some(url.trim().to_string());
        }
        if let Some(raw) = lookup(ENV_CACHE_TTL_HOURS) {
            match raw.trim().parse::<u64>() {
                Ok(hours) => self.cache_ttl_hours = Some(hours),
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid {}", ENV_CACHE_TTL_HOURS),
            }
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        let hours = self
            .cache_ttl_hours
            .map(|h| h.min(MAX_TTL_HOURS) as i64)
            .unwrap_or(DEFAULT_TTL_HOURS);
        chrono::Duration::hours(hours)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.cache_ttl(), chrono::Duration::hours(24));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = Config {
            base_url: Some("http://localhost:8080/data".to_string()),
            cache_ttl_hours: Some(6),
            request_timeout_secs: None,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.cache_ttl(), chrono::Duration::hours(6));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_load_invalid_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BASE_URL, " https://mirror.example/data "),
            (ENV_CACHE_TTL_HOURS, "48"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.base_url(), "https://mirror.example/data");
        assert_eq!(config.cache_ttl_hours, Some(48));
    }

    #[test]
    fn test_env_invalid_ttl_ignored() {
        let mut config = Config {
            cache_ttl_hours: Some(12),
            ..Default::default()
        };
        config.apply_env(|key| (key == ENV_CACHE_TTL_HOURS).then(|| "soon".to_string()));
        assert_eq!(config.cache_ttl_hours, Some(12));
    }
}
