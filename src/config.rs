// Configuration management - where the review service lives and how long to wait for it
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LANGUAGE: &str = "python";

/// Environment variable overriding the configured server root
pub const API_URL_ENV: &str = "CODEREVIEW_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    pub language: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl ReviewConfig {
    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config {}", path.display()))?;
        let config: ReviewConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|dir| dir.join("codereview").join("config.json"))
            .ok_or_else(|| anyhow!("Could not determine config directory or home directory"))
    }

    /// Apply environment and command-line overrides, in that order
    pub fn with_overrides(mut self, env_url: Option<String>, cli_url: Option<String>) -> Self {
        if let Some(url) = env_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(url) = cli_url {
            self.api_url = url;
        }
        self.api_url = self.api_url.trim().trim_end_matches('/').to_string();
        self
    }

    /// Overrides taken from the process environment
    pub fn with_env(self, cli_url: Option<String>) -> Self {
        self.with_overrides(std::env::var(API_URL_ENV).ok(), cli_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow!(
                "Invalid API URL: {} (expected http:// or https://)",
                self.api_url
            ));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("Timeout must be at least 1 second"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ReviewConfig::default();
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.language, "python");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ReviewConfig::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, ReviewConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = ReviewConfig {
            api_url: "https://review.example.com".to_string(),
            timeout_secs: 15,
            language: "java".to_string(),
        };

        config.save_to(&path).unwrap();
        assert_eq!(ReviewConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"timeout_secs": 5}"#).unwrap();

        let config = ReviewConfig::load_from(&path).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(ReviewConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_override_precedence() {
        let base = ReviewConfig::default();

        let env_only = base
            .clone()
            .with_overrides(Some("http://env:9000/".to_string()), None);
        assert_eq!(env_only.api_url, "http://env:9000");

        let both = base.clone().with_overrides(
            Some("http://env:9000".to_string()),
            Some("http://cli:7000".to_string()),
        );
        assert_eq!(both.api_url, "http://cli:7000");

        let blank_env = base.with_overrides(Some("  ".to_string()), None);
        assert_eq!(blank_env.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ReviewConfig {
            api_url: "localhost:8080".to_string(),
            ..ReviewConfig::default()
        };
        assert!(config.validate().is_err());

        config.api_url = DEFAULT_API_URL.to_string();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
