//! Import errors

use sqlkit_core::SqlKitError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading a CSV file, building a table definition or importing rows
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{declared} column types were declared but the CSV has {columns} columns")]
    SchemaMismatch { declared: usize, columns: usize },

    #[error(
        "invalid type for column `{column}`: `{declared_type}` is not a recognized column type (recognized: {})",
        crate::COLUMN_TYPES.join(", ")
    )]
    InvalidColumnType {
        column: String,
        declared_type: String,
    },

    #[error("cannot derive a table name from '{}'", path.display())]
    MissingTableName { path: PathBuf },

    #[error("failed to open '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to create table `{table}`: {source}")]
    CreateTable {
        table: String,
        #[source]
        source: SqlKitError,
    },

    #[error("failed to insert row {row}: {source}")]
    Store {
        /// 1-based position of the row in the CSV data (header excluded)
        row: usize,
        #[source]
        source: SqlKitError,
    },
}

impl ImportError {
    /// True for errors raised before any statement reached the database
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ImportError::SchemaMismatch { .. }
                | ImportError::InvalidColumnType { .. }
                | ImportError::MissingTableName { .. }
                | ImportError::Io { .. }
                | ImportError::Csv(_)
        )
    }

    /// The database error behind a store failure, if any
    pub fn store_error(&self) -> Option<&SqlKitError> {
        match self {
            ImportError::CreateTable { source, .. } | ImportError::Store { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

/// Result type alias for import operations
pub type Result<T> = std::result::Result<T, ImportError>;
