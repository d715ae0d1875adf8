//! sqlkit Core - shared abstractions for the sqlkit crates
//!
//! This crate provides the fundamental traits and types that all other
//! sqlkit crates depend on. It defines:
//!
//! - `DatabaseDriver` - Trait for database driver implementations
//! - `Connection` - Trait for database connections
//! - `ConnectionConfig` - Explicit connection settings, credentials included
//! - Common types like `Value`, `Row`, `ColumnMeta`, `QueryResult`

mod connection;
mod driver;
mod error;
mod types;

pub use connection::*;
pub use driver::*;
pub use error::*;
pub use types::*;
