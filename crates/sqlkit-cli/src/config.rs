//! Connection settings from the config file and command line

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use sqlkit_core::ConnectionConfig;
use std::path::{Path, PathBuf};

/// Environment variable holding the database password
pub const PASSWORD_ENV: &str = "MYSQL_PASSWORD";

const DEFAULT_DRIVER: &str = "mysql";

/// Connection flags, usable before or after the subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Database driver (mysql or sqlite)
    #[arg(long, global = true)]
    pub driver: Option<String>,

    /// Database host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Database port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Database user
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Database name, or file path for sqlite
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Database password (falls back to MYSQL_PASSWORD)
    #[arg(long, global = true)]
    pub password: Option<String>,
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub connection: ConnectionSection,
}

/// `[connection]` table. Passwords are not accepted here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionSection {
    pub driver: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub database: Option<String>,
}

impl CliConfig {
    /// `<config dir>/sqlkit/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sqlkit").join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load an explicitly named file, else the default file if it exists, else defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading config file");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Merge command line flags over file values into a driver configuration
    pub fn connection_config(&self, args: &ConnectionArgs, password: Option<String>) -> ConnectionConfig {
        let file = &self.connection;
        let driver = args
            .driver
            .clone()
            .or_else(|| file.driver.clone())
            .unwrap_or_else(|| DEFAULT_DRIVER.to_string());

        let mut config = ConnectionConfig::new(&driver);
        config.host = args
            .host
            .clone()
            .or_else(|| file.host.clone())
            .unwrap_or_default();
        config.port = args.port.or(file.port).unwrap_or(0);
        config.username = args.user.clone().or_else(|| file.user.clone());
        config.database = args.database.clone().or_else(|| file.database.clone());
        config.password = password;
        config
    }
}

/// The password from `--password`, else from the environment (after `.env` loading)
pub fn resolve_password(flag: Option<String>) -> Option<String> {
    flag.or_else(|| std::env::var(PASSWORD_ENV).ok())
        .filter(|p| !p.is_empty())
}

/// Load `KEY=value` pairs from `path` into the environment if the file exists.
///
/// Variables already set in the environment win.
pub fn load_env_file(path: &Path) -> Result<()> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no env file");
        return Ok(());
    }
    dotenvy::from_path(path)
        .with_context(|| format!("Failed to load env file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "env file loaded");
    Ok(())
}
