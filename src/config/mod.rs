//! Configuration management for wpcsv
//!
//! This module handles loading, parsing, and managing configuration from:
//! - Configuration files (TOML format)
//! - Command-line arguments (applied by the CLI layer)
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::client::{Credentials, DEFAULT_REST_PREFIX, SiteConnection};
use crate::error::{ConfigError, Result};
use crate::export::request::{DEFAULT_CONCURRENCY, DEFAULT_PER_PAGE};
use crate::export::sink::DEFAULT_FILENAME_PREFIX;

/// Largest page size WordPress accepts for collection requests
pub const MAX_PER_PAGE: u32 = 100;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Site connection configuration
    #[serde(default)]
    pub site: SiteConfig,

    /// Export configuration
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Site connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site base URL, e.g. https://example.com
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// REST route prefix
    #[serde(default = "default_rest_prefix")]
    pub rest_prefix: String,

    /// Bearer token (takes precedence over username/password)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Username for basic authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password (application password) for basic authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Export defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Records per page
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Concurrent requests in eager mode
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Prefix of generated filenames
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,

    /// Directory for generated filenames (current directory when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Show a progress bar
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_rest_prefix() -> String {
    DEFAULT_REST_PREFIX.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_filename_prefix() -> String {
    DEFAULT_FILENAME_PREFIX.to_string()
}

fn default_show_progress() -> bool {
    true
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    false
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: None,
            rest_prefix: default_rest_prefix(),
            token: None,
            username: None,
            password: None,
            timeout: default_timeout(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
            concurrency: default_concurrency(),
            filename_prefix: default_filename_prefix(),
            output_dir: None,
            show_progress: default_show_progress(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - `~/.wpcsv/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".wpcsv")
            .join("config.toml")
    }

    /// Load configuration from a file
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present and built-in defaults otherwise.
    ///
    /// # Arguments
    /// * `path` - Optional path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) if !p.exists() => {
                return Err(ConfigError::FileNotFound(p.display().to_string()).into());
            }
            Some(p) => p.to_path_buf(),
            None => {
                let default = Self::default_config_path();
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            ConfigError::InvalidFormat(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Serialize configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Generic(e.to_string()).into())
    }

    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***".to_string());
        let mut copy = self.clone();
        copy.site.token = mask(&self.site.token);
        copy.site.password = mask(&self.site.password);
        copy
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if let Some(ref url) = self.site.url {
            self.site.validate_url(url)?;
        }

        if self.site.timeout == 0 {
            return Err(invalid("site.timeout", self.site.timeout));
        }

        if self.export.per_page == 0 || self.export.per_page > MAX_PER_PAGE {
            return Err(invalid("export.per_page", self.export.per_page));
        }

        if self.export.concurrency == 0 {
            return Err(invalid("export.concurrency", self.export.concurrency));
        }

        if self.site.password.is_some() && self.site.username.is_none() {
            return Err(ConfigError::MissingField("site.username".to_string()).into());
        }

        Ok(())
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.site.timeout)
    }
}

impl SiteConfig {
    fn validate_url(&self, url: &str) -> Result<()> {
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
            _ => Err(invalid("site.url", url)),
        }
    }

    /// Credentials from the configured token or username/password
    pub fn credentials(&self) -> Option<Credentials> {
        if let Some(ref token) = self.token {
            return Some(Credentials::Bearer(token.clone()));
        }
        self.username.as_ref().map(|username| Credentials::Basic {
            username: username.clone(),
            password: self.password.clone().unwrap_or_default(),
        })
    }

    /// Build the connection description used by the REST client
    pub fn connection(&self) -> Result<SiteConnection> {
        let url = self
            .url
            .as_ref()
            .ok_or_else(|| ConfigError::MissingField("site.url (or --site)".to_string()))?;
        self.validate_url(url)?;

        let mut site = SiteConnection::new(url.clone()).with_rest_prefix(self.rest_prefix.clone());
        site.credentials = self.credentials();
        Ok(site)
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn invalid(field: &str, value: impl ToString) -> crate::error::ExportError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}
