use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::persistence::PersistenceConfig;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Runtime configuration, read from `CHAT_*` environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub storage_dir: PathBuf,
    /// Origin allowed to open cross-origin connections
    pub allowed_origin: String,
    pub outbound_queue_capacity: usize,
    pub persistence: PersistenceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            storage_dir: PathBuf::from("chat-storage"),
            allowed_origin: "http://localhost:5173".to_string(),
            outbound_queue_capacity: 64,
            persistence: PersistenceConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Builds the config from a set of variables, falling back to defaults for missing keys
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let interval_secs = parse_or(
            &vars,
            "CHAT_BACKUP_INTERVAL_SECS",
            defaults.persistence.interval.as_secs(),
        )?;
        let retry_delay_ms = parse_or(
            &vars,
            "CHAT_BACKUP_RETRY_DELAY_MS",
            defaults.persistence.retry_delay.as_millis() as u64,
        )?;
        let max_consecutive_failures = parse_or(
            &vars,
            "CHAT_BACKUP_MAX_FAILURES",
            defaults.persistence.max_consecutive_failures,
        )?;
        let outbound_queue_capacity = parse_or(
            &vars,
            "CHAT_OUTBOUND_QUEUE_CAPACITY",
            defaults.outbound_queue_capacity,
        )?;

        // A zero interval or delay would snapshot in a tight loop
        reject_zero("CHAT_BACKUP_INTERVAL_SECS", interval_secs)?;
        reject_zero("CHAT_BACKUP_RETRY_DELAY_MS", retry_delay_ms)?;
        reject_zero("CHAT_OUTBOUND_QUEUE_CAPACITY", outbound_queue_capacity as u64)?;

        Ok(Self {
            bind_addr: vars
                .get("CHAT_BIND_ADDR")
                .cloned()
                .unwrap_or(defaults.bind_addr),
            storage_dir: vars
                .get("CHAT_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            allowed_origin: vars
                .get("CHAT_ALLOWED_ORIGIN")
                .cloned()
                .unwrap_or(defaults.allowed_origin),
            outbound_queue_capacity,
            persistence: PersistenceConfig {
                interval: Duration::from_secs(interval_secs),
                retry_delay: Duration::from_millis(retry_delay_ms),
                max_consecutive_failures,
            },
        })
    }
}

fn parse_or<T: FromStr>(
    vars: &HashMap<String, String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.clone(),
        }),
        None => Ok(default),
    }
}

fn reject_zero(key: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key,
            value: "0".to_string(),
        });
    }
    Ok(())
}
