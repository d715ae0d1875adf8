//! Database driver trait definition

use crate::{Connection, Result, SqlKitError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Core driver trait that all database drivers must implement
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Registry name
    fn name(&self) -> &'static str;

    /// Display name for messages
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Create a new connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;

    /// Open a connection and run a trivial query against it
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()>;

    /// Build a connection string from configuration.
    ///
    /// The password is always masked so the result is safe to log.
    fn build_connection_string(&self, config: &ConnectionConfig) -> String;
}

/// Connection configuration
///
/// Credentials are part of the configuration value. Drivers never look them up
/// in the process environment; whoever builds the config resolves them.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Driver ID (e.g., "mysql", "sqlite")
    pub driver: String,
    /// Host address (empty for file-based databases)
    pub host: String,
    /// Port number (0 for default or file-based)
    pub port: u16,
    /// Database name or file path
    pub database: Option<String>,
    /// Username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Additional connection parameters
    pub params: HashMap<String, String>,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("params", &self.params)
            .finish()
    }
}

impl ConnectionConfig {
    /// Create a new configuration with default values
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            host: String::new(),
            port: 0,
            database: None,
            username: None,
            password: None,
            params: HashMap::new(),
        }
    }

    /// Create a SQLite configuration
    pub fn new_sqlite(database_path: &str) -> Self {
        let mut config = Self::new("sqlite");
        config.database = Some(database_path.to_string());
        config
    }

    /// Create a MySQL configuration
    pub fn new_mysql(host: &str, port: u16, database: &str, username: &str) -> Self {
        let mut config = Self::new("mysql");
        config.host = host.to_string();
        config.port = port;
        config.database = Some(database.to_string());
        config.username = Some(username.to_string());
        config
    }

    /// Attach the password resolved by the caller
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set a connection parameter
    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Get a string parameter
    pub fn get_string(&self, key: &str) -> Option<String> {
        if let Some(val) = self.params.get(key) {
            return Some(val.clone());
        }
        match key {
            "host" if !self.host.is_empty() => Some(self.host.clone()),
            "database" | "path" => self.database.clone(),
            "username" | "user" => self.username.clone(),
            "password" => self.password.clone(),
            _ => None,
        }
    }

    /// Return the password or fail with `CredentialMissing`.
    ///
    /// `source_hint` names where the caller expected the secret to come from
    /// and ends up in the error message.
    pub fn require_password(&self, source_hint: &str) -> Result<&str> {
        match self.password.as_deref() {
            Some(p) if !p.is_empty() => Ok(p),
            _ => Err(SqlKitError::CredentialMissing(format!(
                "no password resolved for {} connection (expected {})",
                self.driver, source_hint
            ))),
        }
    }
}
