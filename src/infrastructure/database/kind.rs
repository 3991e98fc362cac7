//! Driver selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::connection::ConnectionError;

/// Which backend a [`Connection`](super::Connection) talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    /// SQLite through sqlx.
    Sql,
    /// MongoDB.
    NoSql,
    /// In-process store, nothing persisted.
    Memory,
}

impl DatabaseKind {
    pub const ALL: [Self; 3] = [Self::Sql, Self::NoSql, Self::Memory];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::NoSql => "nosql",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseKind {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sql" => Ok(Self::Sql),
            "nosql" => Ok(Self::NoSql),
            "memory" => Ok(Self::Memory),
            _ => Err(ConnectionError::UnsupportedKind(s.to_string())),
        }
    }
}
