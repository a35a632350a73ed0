//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `STORAGE_BACKEND` - `postgres` (default) or `memory`
//! - `DATABASE_URL` - `PostgreSQL` connection string, required for `postgres`
//! - `DATABASE_MAX_CONNECTIONS` - pool size (default: 10)
//! - `NATS_URL` - enables order event publishing when set
//! - `PORT` - listen port (default: 8083)
//! - `ORDER_ID_MAX_PROBES` - allocator probe ceiling (default: 10000)

use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;

use crate::services::OrderIdAllocator;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    Postgres { url: String, max_connections: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub storage: StorageConfig,
    pub nats_url: Option<String>,
    pub port: u16,
    pub max_probes: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_vars(&std::env::vars().collect()) }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let storage = match get("STORAGE_BACKEND").unwrap_or("postgres") {
            "memory" => StorageConfig::Memory,
            "postgres" => StorageConfig::Postgres {
                url: get("DATABASE_URL").ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".into()))?.to_string(),
                max_connections: parse_or(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            other => return Err(ConfigError::InvalidEnvVar("STORAGE_BACKEND".into(), other.to_string())),
        };

        Ok(Self {
            storage,
            nats_url: get("NATS_URL").map(String::from),
            port: parse_or(get("PORT"), "PORT", 8083)?,
            max_probes: parse_or(get("ORDER_ID_MAX_PROBES"), "ORDER_ID_MAX_PROBES", OrderIdAllocator::DEFAULT_MAX_PROBES)?,
        })
    }
}

fn parse_or<T: FromStr>(value: Option<&str>, key: &str, default: T) -> Result<T, ConfigError> {
    value.map_or(Ok(default), |v| v.parse().map_err(|_| ConfigError::InvalidEnvVar(key.to_string(), v.to_string())))
}
