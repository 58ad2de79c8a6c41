//! Application configuration management.
//!
//! Settings are read from `~/.config/clubcache/config.json` (or the platform
//! equivalent), then overridden by the `CLUBCACHE_API_URL` and
//! `CLUBCACHE_TOKEN` environment variables. Missing fields take defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::service::CacheSettings;

/// Application name used for the config directory path
const APP_NAME: &str = "clubcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const API_URL_ENV: &str = "CLUBCACHE_API_URL";
pub const TOKEN_ENV: &str = "CLUBCACHE_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Lifetime of member-detail and rented-facility entries
    pub entity_ttl_secs: u64,
    /// How long a caller waits on another caller's in-flight load
    pub coalesce_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            auth_token: None,
            request_timeout_secs: 30,
            entity_ttl_secs: 300,
            coalesce_timeout_secs: 60,
        }
    }
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(std::env::var(API_URL_ENV).ok(), std::env::var(TOKEN_ENV).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply non-empty overrides for the API URL and token.
    pub fn apply_overrides(&mut self, api_url: Option<String>, token: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.auth_token = Some(token);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            entity_ttl: Duration::from_secs(self.entity_ttl_secs),
            coalesce_timeout: Duration::from_secs(self.coalesce_timeout_secs),
        }
    }

    /// A copy safe to print: the token is masked.
    pub fn redacted(&self) -> Self {
        Self {
            auth_token: self.auth_token.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_takes_defaults() {
        let config: Config = serde_json::from_str(r#"{"api_base_url": "https://club.example"}"#).unwrap();
        assert_eq!(config.api_base_url, "https://club.example");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.cache_settings().entity_ttl, Duration::from_secs(300));
        assert_eq!(config.cache_settings().coalesce_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_overrides_ignore_blank_values() {
        let mut config = Config::default();
        config.apply_overrides(Some("  ".to_string()), Some("secret".to_string()));
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.auth_token.as_deref(), Some("secret"));

        config.apply_overrides(Some("https://other".to_string()), None);
        assert_eq!(config.api_base_url, "https://other");
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_redacted_masks_token() {
        let config = Config {
            auth_token: Some("secret".to_string()),
            ..Config::default()
        };
        assert_eq!(config.redacted().auth_token.as_deref(), Some("********"));
        assert!(Config::default().redacted().auth_token.is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("clubcache-config-{}", std::process::id()))
            .join(CONFIG_FILE);
        let config = Config {
            entity_ttl_secs: 90,
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = std::env::temp_dir().join("clubcache-does-not-exist.json");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }
}
