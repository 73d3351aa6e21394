//! Client configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use pollcheck_types::PAGE_SIZE;

use crate::error::ApiError;

/// Configuration for talking to a Registry.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the Registry, e.g. `http://localhost:4000`.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Whole-request timeout. A stalled call surfaces as a network error.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Rows per page. The Registry contract fixes this at 20.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// File holding the session token between runs.
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,

    /// Views reachable from navigation: any of home, search, dashboard, practice.
    #[serde(default = "default_enabled_views")]
    pub enabled_views: Vec<String>,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_api_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_page_size() -> u32 {
    PAGE_SIZE
}

fn default_token_path() -> PathBuf {
    PathBuf::from("./pollcheck_session.json")
}

fn default_enabled_views() -> Vec<String> {
    vec!["home".to_string(), "search".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, ApiError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ApiError> {
        let config: Self = toml::from_str(s).map_err(|e| ApiError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self).map_err(|e| ApiError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        reqwest::Url::parse(&self.api_url)
            .map_err(|e| ApiError::Config(format!("invalid api_url {:?}: {e}", self.api_url)))?;
        if self.page_size != PAGE_SIZE {
            return Err(ApiError::Config(format!(
                "page_size must be {PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(ApiError::Config("timeouts must be at least one second".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            page_size: default_page_size(),
            token_path: default_token_path(),
            enabled_views: default_enabled_views(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.enabled_views, vec!["home", "search"]);
    }

    #[test]
    fn overrides_are_read() {
        let config = ClientConfig::from_toml_str(
            r#"
            api_url = "https://registry.example.org"
            request_timeout_secs = 30
            enabled_views = ["home", "search", "dashboard"]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.api_url, "https://registry.example.org");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.enabled_views.len(), 3);
    }

    #[test]
    fn rejects_other_page_sizes() {
        assert!(ClientConfig::from_toml_str("page_size = 50").is_err());
    }

    #[test]
    fn rejects_bad_url_and_zero_timeout() {
        assert!(ClientConfig::from_toml_str("api_url = \"not a url\"").is_err());
        assert!(ClientConfig::from_toml_str("request_timeout_secs = 0").is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let config = ClientConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(ClientConfig::from_toml_str(&text).unwrap(), config);
    }
}
