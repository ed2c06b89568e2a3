//! Client configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Base URL used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Environment variable overriding the API base URL
pub const API_BASE_URL_ENV: &str = "CLOUDPANEL_API_BASE_URL";

/// Client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend API configuration
    pub api: ApiConfig,

    /// Periodic refresh configuration
    pub polling: PollingConfig,

    /// Session storage configuration
    pub storage: StorageConfig,

    /// Notification configuration
    pub notifications: NotificationConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Periodic refresh configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Interval between list refreshes
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 30_000 }
    }
}

/// Session storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the session database
    pub session_db: Option<PathBuf>,
}

/// Notification configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// How long a notification stays visible
    pub ttl_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { ttl_ms: 5_000 }
    }
}

impl ClientConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)
                .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(API_BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url;
        }
        self
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api.base_url).map_err(|e| {
            Error::InvalidConfig(format!("api.base_url '{}': {}", self.api.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "api.base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.polling.interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "polling.interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Get the poll interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms)
    }

    /// Get the notification lifetime
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notifications.ttl_ms)
    }

    /// Get the session database path
    pub fn session_db_path(&self) -> PathBuf {
        self.storage
            .session_db
            .clone()
            .unwrap_or_else(crate::default_session_db_path)
    }
}
