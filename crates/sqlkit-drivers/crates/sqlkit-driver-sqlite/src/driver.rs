//! SQLite driver implementation

use async_trait::async_trait;
use sqlkit_core::{Connection, ConnectionConfig, DatabaseDriver, Result, SqlKitError};
use std::sync::Arc;

use crate::SqliteConnection;

/// SQLite database driver
pub struct SqliteDriver;

impl SqliteDriver {
    /// Create a new SQLite driver instance
    pub fn new() -> Self {
        tracing::debug!("SQLite driver initialized");
        Self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn display_name(&self) -> &'static str {
        "SQLite"
    }

    #[tracing::instrument(skip(self, config), fields(path = config.get_string("path").as_deref()))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let path = config.get_string("path").ok_or_else(|| {
            SqlKitError::Configuration(
                "SQLite requires a database path. Example: --database /path/to/database.db".into(),
            )
        })?;

        let conn = SqliteConnection::open(&path)
            .inspect_err(|e| tracing::error!(error = %e, "failed to connect to SQLite database"))?;

        tracing::info!(path = %path, "SQLite connection created");
        Ok(Arc::new(conn))
    }

    #[tracing::instrument(skip(self, config))]
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()> {
        tracing::debug!("testing SQLite connection");
        let conn = self.connect(config).await?;
        conn.query("SELECT 1", &[]).await?;
        Ok(())
    }

    fn build_connection_string(&self, config: &ConnectionConfig) -> String {
        config
            .get_string("path")
            .unwrap_or_else(|| ":memory:".to_string())
    }
}
