//! Tracker configuration for Windlass.
//!
//! Credentials and endpoint for the external tracker are resolved once at
//! startup and passed by reference into every component; nothing here is
//! process-global.
//!
//! ## Precedence (highest first)
//!
//! 1. Environment variables: `WINDLASS_BASE_URL`, `WINDLASS_EMAIL`,
//!    `WINDLASS_API_TOKEN`, `WINDLASS_PROJECT_KEY`
//! 2. Config file: `~/.config/windlass/config.toml`
//!
//! Missing required values are reported together in one error, and a
//! configuration error at startup is the only failure that aborts the run.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Environment variable for the tracker base URL.
pub const ENV_BASE_URL: &str = "WINDLASS_BASE_URL";
/// Environment variable for the account email.
pub const ENV_EMAIL: &str = "WINDLASS_EMAIL";
/// Environment variable for the API token.
pub const ENV_API_TOKEN: &str = "WINDLASS_API_TOKEN";
/// Environment variable for the project key.
pub const ENV_PROJECT_KEY: &str = "WINDLASS_PROJECT_KEY";

/// Validated tracker connection settings.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Tracker base URL, e.g. `https://example.atlassian.net`
    pub base_url: String,
    /// Account email for Basic auth
    pub email: String,
    /// API token for Basic auth
    pub api_token: String,
    /// Project key scoping searches and task creation, e.g. `WL`
    pub project_key: String,
}

/// On-disk shape of the optional config file. All keys optional; validation
/// happens after merging with the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub email: Option<String>,
    pub api_token: Option<String>,
    pub project_key: Option<String>,
}

impl ConfigFile {
    /// Parse a config file if it exists; an absent file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}

/// Default config file location (`~/.config/windlass/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("windlass").join("config.toml"))
}

impl TrackerConfig {
    /// Resolve configuration from the environment and the default config
    /// file location.
    pub fn resolve() -> Result<Self> {
        let file = match default_config_path() {
            Some(path) => ConfigFile::load(&path)?,
            None => ConfigFile::default(),
        };
        Self::from_sources(&file, |name| std::env::var(name).ok())
    }

    /// Merge environment values over file values and validate.
    ///
    /// The env lookup is injected so tests can exercise precedence without
    /// mutating process state.
    pub fn from_sources<F>(file: &ConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |env_name: &str, file_value: &Option<String>| {
            env(env_name)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file_value.clone())
        };

        let base_url = pick(ENV_BASE_URL, &file.base_url);
        let email = pick(ENV_EMAIL, &file.email);
        let api_token = pick(ENV_API_TOKEN, &file.api_token);
        let project_key = pick(ENV_PROJECT_KEY, &file.project_key);

        let mut missing = Vec::new();
        if base_url.is_none() {
            missing.push(ENV_BASE_URL);
        }
        if email.is_none() {
            missing.push(ENV_EMAIL);
        }
        if api_token.is_none() {
            missing.push(ENV_API_TOKEN);
        }
        if project_key.is_none() {
            missing.push(ENV_PROJECT_KEY);
        }
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing required settings: {}. Set the environment variables or add them to the config file.",
                missing.join(", ")
            )));
        }

        Ok(Self {
            base_url: base_url.unwrap_or_default(),
            email: email.unwrap_or_default(),
            api_token: api_token.unwrap_or_default(),
            project_key: project_key.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn full_file() -> ConfigFile {
        ConfigFile {
            base_url: Some("https://file.example.com".to_string()),
            email: Some("file@example.com".to_string()),
            api_token: Some("file-token".to_string()),
            project_key: Some("FILE".to_string()),
        }
    }

    #[test]
    fn test_env_overrides_file() {
        let config = TrackerConfig::from_sources(
            &full_file(),
            env_of(&[(ENV_BASE_URL, "https://env.example.com")]),
        )
        .unwrap();
        assert_eq!(config.base_url, "https://env.example.com");
        assert_eq!(config.email, "file@example.com");
    }

    #[test]
    fn test_file_only() {
        let config = TrackerConfig::from_sources(&full_file(), env_of(&[])).unwrap();
        assert_eq!(config.project_key, "FILE");
        assert_eq!(config.api_token, "file-token");
    }

    #[test]
    fn test_missing_values_reported_together() {
        let err = TrackerConfig::from_sources(
            &ConfigFile::default(),
            env_of(&[(ENV_EMAIL, "dev@example.com")]),
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(ENV_BASE_URL));
        assert!(msg.contains(ENV_API_TOKEN));
        assert!(msg.contains(ENV_PROJECT_KEY));
        assert!(!msg.contains("WINDLASS_EMAIL,"));
    }

    #[test]
    fn test_blank_env_value_ignored() {
        let config =
            TrackerConfig::from_sources(&full_file(), env_of(&[(ENV_EMAIL, "  ")])).unwrap();
        assert_eq!(config.email, "file@example.com");
    }

    #[test]
    fn test_config_file_load_missing_is_empty() {
        let file = ConfigFile::load(Path::new("/nonexistent/windlass/config.toml")).unwrap();
        assert!(file.base_url.is_none());
    }

    #[test]
    fn test_config_file_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "base_url = \"https://t.example.com\"\nproject_key = \"WL\"\n",
        )
        .unwrap();

        let file = ConfigFile::load(&path).unwrap();
        assert_eq!(file.base_url.as_deref(), Some("https://t.example.com"));
        assert_eq!(file.project_key.as_deref(), Some("WL"));
        assert!(file.email.is_none());
    }
}
