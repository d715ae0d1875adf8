//! MySQL driver implementation

use async_trait::async_trait;
use sqlkit_core::{Connection, ConnectionConfig, DatabaseDriver, Result};
use std::sync::Arc;

use crate::MySqlConnection;

const DEFAULT_PORT: u16 = 3306;

/// MySQL database driver
pub struct MySqlDriver;

impl MySqlDriver {
    /// Create a new MySQL driver instance
    pub fn new() -> Self {
        tracing::debug!("MySQL driver initialized");
        Self
    }
}

impl Default for MySqlDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for MySqlDriver {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn display_name(&self) -> &'static str {
        "MySQL"
    }

    #[tracing::instrument(skip(self, config), fields(host = config.get_string("host").as_deref(), database = config.get_string("database").as_deref()))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let password = config.require_password("--password or MYSQL_PASSWORD")?;
        let host = config
            .get_string("host")
            .unwrap_or_else(|| "localhost".to_string());
        let port = if config.port > 0 { config.port } else { DEFAULT_PORT };
        let database = config.get_string("database");
        let user = config.get_string("user");

        let conn = MySqlConnection::connect(
            &host,
            port,
            database.as_deref(),
            user.as_deref(),
            password,
        )
        .await
        .inspect_err(|e| tracing::error!(error = %e, "failed to connect to MySQL database"))?;

        tracing::info!(host = %host, port = %port, database = ?database, "MySQL connection created");
        Ok(Arc::new(conn))
    }

    #[tracing::instrument(skip(self, config))]
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()> {
        tracing::debug!("testing MySQL connection");
        let conn = self.connect(config).await?;
        conn.query("SELECT 1", &[]).await?;
        conn.close().await
    }

    fn build_connection_string(&self, config: &ConnectionConfig) -> String {
        let host = config
            .get_string("host")
            .unwrap_or_else(|| "localhost".to_string());
        let port = if config.port > 0 { config.port } else { DEFAULT_PORT };

        let mut conn_str = String::from("mysql://");

        if let Some(u) = config.get_string("user") {
            conn_str.push_str(&u);
            if config.password.is_some() {
                conn_str.push_str(":***");
            }
            conn_str.push('@');
        }

        conn_str.push_str(&format!("{}:{}", host, port));

        if let Some(db) = config.get_string("database") {
            conn_str.push('/');
            conn_str.push_str(&db);
        }

        conn_str
    }
}
