use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for docstore
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database driver and connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Driver to use: sql, nosql or memory
    #[serde(default = "default_database_kind")]
    pub kind: String,

    /// Connection URI (`sqlite:` path for sql, `mongodb://` for nosql)
    #[serde(default = "default_database_uri")]
    pub uri: String,

    /// Database name collections are opened in
    #[serde(default = "default_database_name")]
    pub name: String,

    /// Maximum number of pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Timeout for the initial connection and ping, in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Per-operation deadline in milliseconds; unset means no deadline
    #[serde(default)]
    pub query_timeout_ms: Option<u64>,
}

fn default_database_kind() -> String {
    "sql".to_string()
}

fn default_database_uri() -> String {
    "sqlite:.docstore/docstore.db".to_string()
}

fn default_database_name() -> String {
    "repo".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: default_database_kind(),
            uri: default_database_uri(),
            name: default_database_name(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            query_timeout_ms: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; console only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,

    /// Log to stderr as well as to the log directory
    #[serde(default = "default_true")]
    pub enable_console: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
            enable_console: default_true(),
        }
    }
}
