use anyhow::{Context, Result};
use licensewatch_db::db::{DEFAULT_DATABASE_URL, DatabaseSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_PATHS: [&str; 2] = ["/etc/licensewatch/panel.toml", "./panel.toml"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

/// A config together with where it came from, for the startup log.
pub struct LoadedConfig {
    pub config: PanelConfig,
    pub source: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    8501
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_auto_migrate() -> bool {
    true
}

fn default_log_dir() -> String {
    ".".to_string()
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            listen_port: default_listen_port(),
            database: DatabaseSettings::default(),
            max_upload_bytes: default_max_upload_bytes(),
            auto_migrate: default_auto_migrate(),
            log_dir: default_log_dir(),
        }
    }
}

impl PanelConfig {
    /// Loads `explicit` when given; otherwise the first readable file of
    /// the standard locations, falling back to environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
        if let Some(path) = explicit {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            return Ok(LoadedConfig {
                config: Self::from_toml_str(&contents)?,
                source: path.display().to_string(),
            });
        }

        for path in CONFIG_PATHS {
            if let Ok(contents) = fs::read_to_string(path) {
                return Ok(LoadedConfig {
                    config: Self::from_toml_str(&contents)?,
                    source: path.to_string(),
                });
            }
        }

        Ok(LoadedConfig {
            config: Self::from_env()?,
            source: "environment".to_string(),
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid panel config")
    }

    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            listen_port: env_parse("LISTEN_PORT", defaults.listen_port)?,
            database: DatabaseSettings {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_parse(
                    "DB_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                )?,
                acquire_timeout_secs: env_parse(
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    defaults.database.acquire_timeout_secs,
                )?,
            },
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            auto_migrate: env_parse("AUTO_MIGRATE", defaults.auto_migrate)?,
            log_dir: std::env::var("LOG_DIR").unwrap_or(defaults.log_dir),
        })
    }

    pub fn listen_socket(&self) -> Result<std::net::SocketAddr> {
        format!("{}:{}", self.listen_addr, self.listen_port)
            .parse()
            .with_context(|| {
                format!(
                    "Invalid listen address {}:{}",
                    self.listen_addr, self.listen_port
                )
            })
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
