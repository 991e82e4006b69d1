//! Client configuration parsing, validation, and environment overrides.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::{AppError, Result};

/// Environment variable that overrides [`ClientConfig::base_url`].
pub const BASE_URL_ENV: &str = "SCREENING_API_BASE";

/// Base URL used when neither the config file nor the environment set one.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_health_interval_seconds() -> u64 {
    10
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_max_record_bytes() -> usize {
    1_048_576
}

/// Client configuration parsed from an optional `config.toml`.
///
/// Every key has a default, so an empty document is a valid configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ClientConfig {
    /// Root of the backend API; endpoint paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Period between liveness probes.
    #[serde(default = "default_health_interval_seconds")]
    pub health_interval_seconds: u64,
    /// Timeout for short requests (health, results, decisions). The
    /// screening stream itself is never timed out.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// Largest single stream record accepted before it is discarded.
    #[serde(default = "default_max_record_bytes")]
    pub max_record_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            health_interval_seconds: default_health_interval_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
            max_record_bytes: default_max_record_bytes(),
        }
    }
}

impl ClientConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the [`BASE_URL_ENV`] override, if set and non-empty.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the overridden URL is invalid.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        match env::var(BASE_URL_ENV) {
            Ok(value) if !value.trim().is_empty() => {
                debug!(base_url = %value, "base url overridden from environment");
                self.set_base_url(value)
            }
            _ => Ok(()),
        }
    }

    /// Replace the base URL and re-validate.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the URL is not an absolute http(s) URL.
    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> Result<()> {
        self.base_url = base_url.into();
        self.validate()
    }

    /// Build the absolute URL of an endpoint below the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Liveness probe period.
    #[must_use]
    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_seconds)
    }

    /// Timeout applied to short requests.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    fn validate(&mut self) -> Result<()> {
        let trimmed = self.base_url.trim().trim_end_matches('/').to_owned();
        let url = Url::parse(&trimmed)
            .map_err(|err| AppError::Config(format!("base_url invalid: {err}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "base_url must use http or https, got {}",
                url.scheme()
            )));
        }
        self.base_url = trimmed;

        if self.health_interval_seconds == 0 {
            return Err(AppError::Config(
                "health_interval_seconds must be greater than zero".into(),
            ));
        }
        if self.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "request_timeout_seconds must be greater than zero".into(),
            ));
        }
        if self.max_record_bytes == 0 {
            return Err(AppError::Config(
                "max_record_bytes must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
