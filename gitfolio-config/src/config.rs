//! The `Config` struct, its YAML persistence, and validation.
//!
//! Covers:
//! - `load` / `load_from` / `save` / `save_to` (YAML file I/O with atomic write)
//! - Platform path helpers (`config_dir`, `config_path`)
//! - `validate` and `apply_env_overrides`

use crate::error::ConfigError;
use crate::types::LogLevel;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound on `artifacts.max_retries`; beyond this the linear backoff
/// keeps a chart spinner alive for minutes.
const MAX_ARTIFACT_RETRIES: u32 = 20;

/// Client configuration for talking to the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the analysis service (e.g. `http://localhost:8000`)
    #[serde(default = "crate::defaults::api_url")]
    pub api_url: String,

    /// Allow plain HTTP to non-loopback hosts (loopback is always allowed)
    #[serde(default)]
    pub allow_http: bool,

    /// Timeout for the cached-profile read, in seconds
    #[serde(default = "crate::defaults::cache_timeout_secs")]
    pub cache_timeout_secs: u64,

    /// Optional timeout for the compute trigger, in seconds.
    /// Unset means the transport default applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_timeout_secs: Option<u64>,

    /// Maximum profile JSON body size in bytes
    #[serde(default = "crate::defaults::max_response_bytes")]
    pub max_response_bytes: usize,

    /// Delay between a successful compute response and publishing the record
    #[serde(default = "crate::defaults::settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Chart loader settings
    #[serde(default)]
    pub artifacts: ArtifactConfig,

    /// Debug log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Retry settings for chart artifact loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Retries after the first failed probe before a chart is unavailable
    #[serde(default = "crate::defaults::artifact_max_retries")]
    pub max_retries: u32,

    /// Backoff increment; retry `n` waits `n * base_delay_ms`
    #[serde(default = "crate::defaults::artifact_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Delay before the very first probe
    #[serde(default = "crate::defaults::artifact_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum image body size in bytes
    #[serde(default = "crate::defaults::artifact_max_image_bytes")]
    pub max_image_bytes: usize,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            max_retries: crate::defaults::artifact_max_retries(),
            base_delay_ms: crate::defaults::artifact_base_delay_ms(),
            initial_delay_ms: crate::defaults::artifact_initial_delay_ms(),
            max_image_bytes: crate::defaults::artifact_max_image_bytes(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: crate::defaults::api_url(),
            allow_http: false,
            cache_timeout_secs: crate::defaults::cache_timeout_secs(),
            compute_timeout_secs: None,
            max_response_bytes: crate::defaults::max_response_bytes(),
            settle_delay_ms: crate::defaults::settle_delay_ms(),
            artifacts: ArtifactConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the analysis service base URL
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set the post-compute settle delay
    pub fn with_settle_delay_ms(mut self, ms: u64) -> Self {
        self.settle_delay_ms = ms;
        self
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_timeout_secs)
    }

    pub fn compute_timeout(&self) -> Option<Duration> {
        self.compute_timeout_secs.map(Duration::from_secs)
    }

    /// The base URL without a trailing slash, ready for path concatenation.
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Configuration directory (`~/.config/gitfolio` on Linux).
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gitfolio")
    }

    /// Path of the main config file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Load configuration from the default path, falling back to defaults
    /// when no file exists yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        log::info!("Config path: {:?}", config_path);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            log::info!("Config file not found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        log::info!("Loading config from {:?}", path);

        let contents = fs::read_to_string(path)
            .map_err(ConfigError::from)
            .with_context(|| format!("Failed to read config file {path:?}"))?;

        // An empty file is a valid "all defaults" config.
        let config: Config = if contents.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(&contents)
                .map_err(ConfigError::from)
                .with_context(|| format!("Failed to parse config file {path:?}"))?
        };

        config
            .validate()
            .with_context(|| format!("Invalid config file {path:?}"))?;
        Ok(config)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(ConfigError::from)
                .with_context(|| format!("Failed to create config directory {parent:?}"))?;
        }

        let yaml = serde_yaml_ng::to_string(self).map_err(ConfigError::from)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml).map_err(ConfigError::from)?;
        fs::rename(&temp_path, path).map_err(ConfigError::from)?;

        log::info!("Config saved to {:?}", path);
        Ok(())
    }

    /// Check field values that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.api_url).map_err(|e| {
            ConfigError::Validation(format!("api_url '{}' is not a valid URL: {}", self.api_url, e))
        })?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ConfigError::Validation(format!(
                    "api_url scheme '{}' is not supported; use http or https",
                    scheme
                )));
            }
        }

        if self.artifacts.max_retries > MAX_ARTIFACT_RETRIES {
            return Err(ConfigError::Validation(format!(
                "artifacts.max_retries must be at most {}, got {}",
                MAX_ARTIFACT_RETRIES, self.artifacts.max_retries
            )));
        }
        if self.artifacts.base_delay_ms == 0 {
            return Err(ConfigError::Validation(
                "artifacts.base_delay_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment overrides (currently only `GITFOLIO_API_URL`).
    pub fn apply_env_overrides(&mut self) {
        self.apply_api_url_override(std::env::var(crate::API_URL_ENV).ok());
    }

    fn apply_api_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.map(|v| v.trim().to_string())
            && !url.is_empty()
        {
            log::info!("Using api_url from {}: {}", crate::API_URL_ENV, url);
            self.api_url = url;
        }
    }
}
