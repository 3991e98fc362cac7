//! Process-wide, connect-once database handle.

use tokio::sync::OnceCell;
use tracing::warn;

use crate::domain::models::DatabaseConfig;

use super::connection::{connect, Connection, ConnectionError};

/// Lazily connects on first use and hands the same outcome to every caller.
///
/// Concurrent first callers wait on a single connection attempt. A failed
/// attempt is cached as well; build a new handle to try again.
pub struct DatabaseHandle {
    config: DatabaseConfig,
    outcome: OnceCell<Result<Connection, ConnectionError>>,
}

impl DatabaseHandle {
    pub const fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            outcome: OnceCell::const_new(),
        }
    }

    pub const fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// The shared connection, connecting if no attempt has been made yet.
    pub async fn get(&self) -> Result<&Connection, ConnectionError> {
        let outcome = self
            .outcome
            .get_or_init(|| async {
                let result = connect(&self.config).await;
                if let Err(ref err) = result {
                    warn!(error = %err, "database connection failed");
                }
                result
            })
            .await;
        outcome.as_ref().map_err(Clone::clone)
    }

    /// Whether a connection attempt has completed, successfully or not.
    pub fn is_initialized(&self) -> bool {
        self.outcome.initialized()
    }
}
