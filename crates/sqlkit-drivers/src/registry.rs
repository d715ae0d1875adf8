//! Driver registry for managing available database drivers

use sqlkit_core::{Connection, ConnectionConfig, DatabaseDriver, Result, SqlKitError};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of available database drivers
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        #[cfg(feature = "mysql")]
        registry.register(Arc::new(crate::mysql::MySqlDriver::new()));
        #[cfg(feature = "sqlite")]
        registry.register(Arc::new(crate::sqlite::SqliteDriver::new()));

        registry
    }

    /// Register a new driver
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let name = driver.name().to_string();
        tracing::debug!(driver = %name, "registering database driver");
        self.drivers.insert(name, driver);
    }

    /// Get a driver by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self.drivers.get(name).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %name, "driver not found in registry");
        }
        driver
    }

    /// List all registered driver names, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Check if a driver is registered
    pub fn has(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    /// Open a connection with the driver named in `config.driver`
    pub async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let driver = self.get(&config.driver).ok_or_else(|| {
            SqlKitError::Configuration(format!(
                "unknown driver '{}' (available: {})",
                config.driver,
                self.list().join(", ")
            ))
        })?;
        tracing::info!(
            driver = driver.display_name(),
            target = %driver.build_connection_string(config),
            "connecting"
        );
        driver.connect(config).await
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
