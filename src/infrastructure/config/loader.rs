use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;
use crate::infrastructure::database::DatabaseKind;

/// Project config file, read from the working directory.
pub const PROJECT_CONFIG_FILE: &str = "docstore.yaml";
/// Optional local overrides, kept out of version control.
pub const LOCAL_CONFIG_FILE: &str = ".docstore/local.yaml";
/// Prefix of environment overrides; nested keys are split on `__`.
pub const ENV_PREFIX: &str = "DOCSTORE_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["json", "pretty"];
const ROTATIONS: [&str; 3] = ["daily", "hourly", "never"];

/// Configuration error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported database kind: {0}. Must be one of: sql, nosql, memory")]
    UnsupportedDatabaseKind(String),

    #[error("Database uri cannot be empty")]
    EmptyDatabaseUri,

    #[error("Database name cannot be empty")]
    EmptyDatabaseName,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid connect_timeout_secs: {0}. Must be at least 1")]
    InvalidConnectTimeout(u64),

    #[error("Invalid query_timeout_ms: 0. Omit it to disable the deadline")]
    ZeroQueryTimeout,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. docstore.yaml (project config)
    /// 3. .docstore/local.yaml (local overrides, optional)
    /// 4. Environment variables (DOCSTORE_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_layered(&[
            PathBuf::from(PROJECT_CONFIG_FILE),
            PathBuf::from(LOCAL_CONFIG_FILE),
        ])
    }

    /// Defaults, then each file in order, then the environment. Missing
    /// files are skipped.
    pub fn load_layered(files: &[PathBuf]) -> Result<Config> {
        let figment = files
            .iter()
            .fold(Figment::new().merge(Serialized::defaults(Config::default())), |fig, file| {
                fig.merge(Yaml::file(file))
            })
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file. The environment still
    /// overrides it.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        Self::load_layered(&[path.to_path_buf()])
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let database = &config.database;

        let kind = database
            .kind
            .parse::<DatabaseKind>()
            .map_err(|_| ConfigError::UnsupportedDatabaseKind(database.kind.clone()))?;

        if kind != DatabaseKind::Memory && database.uri.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseUri);
        }

        if database.name.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseName);
        }

        if database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(database.max_connections));
        }

        if database.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidConnectTimeout(
                database.connect_timeout_secs,
            ));
        }

        if database.query_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroQueryTimeout);
        }

        let logging = &config.logging;
        if !LOG_LEVELS.contains(&logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(logging.level.clone()));
        }

        if !LOG_FORMATS.contains(&logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(logging.format.clone()));
        }

        if !ROTATIONS.contains(&logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(logging.rotation.clone()));
        }

        Ok(())
    }
}
