// src/config.rs

//! Manages server configuration: loading, defaults, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::warn;

/// Which handshake new connections go through.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Username only; names are unique among online users.
    Name,
    /// Username and password, with accounts persisted in the credentials file.
    #[default]
    Password,
}

/// Handshake settings.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    /// The JSON file holding registered accounts. Only used in `password` mode.
    #[serde(default = "default_credentials_file")]
    pub credentials_file: String,
    /// Wrong passwords allowed before the connection is dropped.
    #[serde(default = "default_max_password_attempts")]
    pub max_password_attempts: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::default(),
            credentials_file: default_credentials_file(),
            max_password_attempts: default_max_password_attempts(),
        }
    }
}

fn default_credentials_file() -> String {
    "chat_data/users.json".to_string()
}
fn default_max_password_attempts() -> u32 {
    3
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MetricsConfig {
    /// If true, an HTTP server will be started to expose Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,
    /// The port for the Prometheus metrics server.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

fn default_metrics_port() -> u16 {
    8878
}

/// A raw representation of the config file before validation.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_max_line_length")]
    max_line_length: usize,
    #[serde(default)]
    auth: AuthConfig,
    #[serde(default)]
    metrics: MetricsConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_line_length() -> usize {
    8192
}

/// Represents the final, validated server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Inbound lines longer than this are rejected with a notice.
    pub max_line_length: usize,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            max_line_length: default_max_line_length(),
            auth: AuthConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents).with_context(|| format!("Invalid config in '{path}'"))
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw_config: RawConfig =
            toml::from_str(contents).context("Failed to parse TOML configuration")?;

        let config = Config {
            host: raw_config.host,
            port: raw_config.port,
            log_level: raw_config.log_level,
            max_line_length: raw_config.max_line_length,
            auth: raw_config.auth,
            metrics: raw_config.metrics,
        };

        config.validate()?;
        Ok(config)
    }

    /// Replaces the listening port and re-runs validation, so a command-line
    /// port is held to the same rules as one from the file.
    pub fn override_port(&mut self, port: u16) -> Result<()> {
        self.port = port;
        self.validate()
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.max_line_length == 0 {
            return Err(anyhow!("max_line_length cannot be 0"));
        }
        if self.max_line_length < 64 {
            warn!(
                "very low max_line_length setting: {} bytes. Most chat lines will be rejected.",
                self.max_line_length
            );
        }

        if self.auth.mode == AuthMode::Password {
            if self.auth.credentials_file.trim().is_empty() {
                return Err(anyhow!(
                    "auth.credentials_file cannot be empty when auth.mode is \"password\""
                ));
            }
            if self.auth.max_password_attempts == 0 {
                return Err(anyhow!("auth.max_password_attempts cannot be 0"));
            }
        }

        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(anyhow!("metrics.port cannot be 0"));
            }
            if self.metrics.port == self.port {
                return Err(anyhow!(
                    "metrics.port cannot be the same as the main server port"
                ));
            }
        }
        Ok(())
    }
}
