//! sqlkit interchange
//!
//! Turns a CSV file into a validated table definition and the statements
//! that create and fill the table.
//!
//! ```text
//! CSV file → Dataset → TableDefinition ─┬→ CREATE TABLE IF NOT EXISTS
//!                          ↑             └→ INSERT INTO ... (one per row)
//!                   declared types
//!                   + TableOptions
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let importer = CsvImporter::new(connection);
//! let plan = importer.plan(Path::new("clients.csv"), &types, TableOptions::default())?;
//! let result = importer.execute(&plan).await?;
//! ```

mod csv_import;
mod dataset;
mod error;
mod table_definition;
mod type_mapping;

pub use csv_import::{
    CsvImportProgress, CsvImportProgressCallback, CsvImportResult, CsvImportSettings, CsvImporter,
    ImportPlan, plan_import, table_name_from_path,
};
pub use dataset::{Dataset, NA_MARKERS, parse_cell};
pub use error::{ImportError, Result};
pub use table_definition::{ColumnSpec, ForeignKeyRef, InsertStatement, TableDefinition, TableOptions};
pub use type_mapping::{COLUMN_TYPES, base_type, is_valid_column_type};
