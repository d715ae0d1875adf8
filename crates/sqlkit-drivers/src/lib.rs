//! sqlkit drivers
//!
//! Concrete implementations of the connection and driver traits defined in
//! `sqlkit-core`, plus a registry to look them up by name.

#[cfg(feature = "mysql")]
pub use sqlkit_driver_mysql as mysql;
#[cfg(feature = "sqlite")]
pub use sqlkit_driver_sqlite as sqlite;

mod registry;

pub use registry::DriverRegistry;

/// Re-export commonly used types from sqlkit-core
pub use sqlkit_core::{
    ColumnMeta, Connection, ConnectionConfig, DatabaseDriver, QueryResult, Result, Row,
    SqlKitError, StatementResult, Value,
};
