//! sqlkit services layer
//!
//! The three user-facing operations, on top of a `Connection`:
//!
//! - [`TableService::query`] - run an ad-hoc statement and return its rows
//! - [`TableService::drop_table`] - drop a table if it exists
//! - [`TableService::create_table_from_csv`] - validate a CSV against declared
//!   column types, create the table and insert every row
//!
//! # Architecture
//!
//! ```text
//! CLI (sqlkit-cli)
//!     ↓
//! Service Layer (sqlkit-services) ← This crate
//!     ↓
//! Domain Layer (sqlkit-interchange)
//!     ↓
//! Infrastructure Layer (sqlkit-core, sqlkit-drivers)
//! ```

mod error;
mod table_service;

pub use error::{ServiceError, ServiceResult};
pub use table_service::TableService;

pub use sqlkit_interchange::{
    CsvImportProgress, CsvImportResult, CsvImportSettings, ForeignKeyRef, ImportPlan, TableOptions,
};
