//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OFFLINE_SW_*)
//! 2. TOML config file (if OFFLINE_SW_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The version string is the only cache-invalidation signal: bump it whenever
//! the deployed assets change.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::worker::WorkerConfig;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OFFLINE_SW_*)
/// 2. TOML config file (if OFFLINE_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Store namespace, the fixed prefix of every store name.
    ///
    /// Set via OFFLINE_SW_NAMESPACE environment variable.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Deployment version tag.
    ///
    /// Set via OFFLINE_SW_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Paths fetched and stored during install, in order.
    ///
    /// Set via OFFLINE_SW_PRECACHE environment variable (`[/a, /b]`).
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Origin the precache paths are resolved against.
    ///
    /// Set via OFFLINE_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to SQLite store database.
    ///
    /// Set via OFFLINE_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via OFFLINE_SW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes buffered per response.
    ///
    /// Set via OFFLINE_SW_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via OFFLINE_SW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_namespace() -> String {
    "poker".into()
}

fn default_version() -> String {
    "v1".into()
}

fn default_precache() -> Vec<String> {
    vec!["/poker/".into(), "/poker/index.html".into()]
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./offline-sw-cache.sqlite")
}

fn default_user_agent() -> String {
    "offline-sw/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            version: default_version(),
            precache: default_precache(),
            origin: default_origin(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The configuration injected into a [`crate::Worker`].
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            namespace: self.namespace.clone(),
            version: self.version.clone(),
            precache: self.precache.clone(),
            origin: self.origin.clone(),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OFFLINE_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OFFLINE_SW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        tracing::debug!(namespace = %config.namespace, version = %config.version, "configuration loaded");

        Ok(config)
    }
}
