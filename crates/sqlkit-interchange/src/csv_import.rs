//! CSV import
//!
//! Planning reads the file and builds every statement without touching the
//! database. Execution runs the DDL, then each insert as its own committed
//! statement in file order, stopping at the first failure.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlkit_core::Connection;

use crate::{Dataset, ImportError, InsertStatement, Result, TableDefinition, TableOptions};

/// Progress callback for import operations
pub type CsvImportProgressCallback = Box<dyn Fn(CsvImportProgress) + Send + Sync>;

/// Import progress information
#[derive(Debug, Clone)]
pub struct CsvImportProgress {
    /// Target table
    pub table_name: String,
    /// Rows handed to the database so far
    pub rows_processed: u64,
    /// Rows inserted so far
    pub rows_added: u64,
    /// Rows in the plan
    pub total_rows: u64,
    pub message: String,
}

/// Result of a completed import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvImportResult {
    pub table_name: String,
    pub rows_added: u64,
}

/// How the CSV source is read
#[derive(Debug, Clone)]
pub struct CsvImportSettings {
    /// Field delimiter byte
    pub delimiter: u8,
    /// Table name to use instead of the file stem
    pub table_name: Option<String>,
}

impl Default for CsvImportSettings {
    fn default() -> Self {
        Self {
            delimiter: b',',
            table_name: None,
        }
    }
}

/// Everything an import will send to the database, in order
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub source: PathBuf,
    pub table: TableDefinition,
    pub create_sql: String,
    pub inserts: Vec<InsertStatement>,
}

impl ImportPlan {
    pub fn table_name(&self) -> &str {
        &self.table.table_name
    }

    pub fn row_count(&self) -> usize {
        self.inserts.len()
    }
}

/// Derive a table name from a CSV path: the file name without its extension.
pub fn table_name_from_path(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| ImportError::MissingTableName {
            path: path.to_path_buf(),
        })
}

/// Read `path` and build the import plan. Performs no database I/O.
pub fn plan_import<S: AsRef<str>>(
    path: &Path,
    declared_types: &[S],
    options: TableOptions,
    settings: &CsvImportSettings,
) -> Result<ImportPlan> {
    let table_name = match &settings.table_name {
        Some(name) => name.clone(),
        None => table_name_from_path(path)?,
    };

    let dataset = Dataset::from_path(path, settings.delimiter)?;
    let table = TableDefinition::build(table_name, &dataset, declared_types, options)?;
    let create_sql = table.create_table_sql();
    let inserts = table.insert_statements(&dataset);

    tracing::debug!(
        table = %table.table_name,
        columns = table.columns.len(),
        rows = inserts.len(),
        auto_id = table.has_auto_id(),
        "import planned"
    );

    Ok(ImportPlan {
        source: path.to_path_buf(),
        table,
        create_sql,
        inserts,
    })
}

/// Creates a table from a CSV file and inserts its rows
pub struct CsvImporter {
    connection: Arc<dyn Connection>,
    settings: CsvImportSettings,
    progress_callback: Option<CsvImportProgressCallback>,
}

impl CsvImporter {
    /// Create a new CSV importer
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            settings: CsvImportSettings::default(),
            progress_callback: None,
        }
    }

    pub fn with_settings(mut self, settings: CsvImportSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set progress callback
    pub fn with_progress_callback(mut self, callback: CsvImportProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn report_progress(&self, progress: CsvImportProgress) {
        if let Some(ref callback) = self.progress_callback {
            callback(progress);
        }
    }

    /// Validate the file against `declared_types` and build every statement
    pub fn plan<S: AsRef<str>>(
        &self,
        path: &Path,
        declared_types: &[S],
        options: TableOptions,
    ) -> Result<ImportPlan> {
        plan_import(path, declared_types, options, &self.settings)
    }

    /// Create the table and insert the planned rows.
    ///
    /// Rows that were inserted before a failing row stay in the table.
    #[tracing::instrument(skip(self, plan), fields(table = %plan.table_name(), rows = plan.row_count()))]
    pub async fn execute(&self, plan: &ImportPlan) -> Result<CsvImportResult> {
        let table_name = plan.table_name().to_string();
        let total_rows = plan.row_count() as u64;

        self.connection
            .execute(&plan.create_sql, &[])
            .await
            .map_err(|source| ImportError::CreateTable {
                table: table_name.clone(),
                source,
            })?;
        tracing::info!(table = %table_name, "table created");

        self.report_progress(CsvImportProgress {
            table_name: table_name.clone(),
            rows_processed: 0,
            rows_added: 0,
            total_rows,
            message: format!("Created table `{}`", table_name),
        });

        let mut result = CsvImportResult {
            table_name: table_name.clone(),
            rows_added: 0,
        };
        let mut rows_processed: u64 = 0;

        for (idx, insert) in plan.inserts.iter().enumerate() {
            rows_processed += 1;
            if let Err(source) = self
                .connection
                .execute_named(&insert.sql, &insert.params)
                .await
            {
                let row = idx + 1;
                tracing::error!(
                    table = %table_name,
                    row,
                    rows_added = result.rows_added,
                    error = %source,
                    "insert failed, import aborted"
                );
                return Err(ImportError::Store { row, source });
            }
            result.rows_added += 1;

            // Report progress every 100 rows
            if rows_processed % 100 == 0 {
                self.report_progress(CsvImportProgress {
                    table_name: table_name.clone(),
                    rows_processed,
                    rows_added: result.rows_added,
                    total_rows,
                    message: format!("Processed {} rows...", rows_processed),
                });
            }
        }

        self.report_progress(CsvImportProgress {
            table_name: table_name.clone(),
            rows_processed,
            rows_added: result.rows_added,
            total_rows,
            message: format!(
                "Import complete. {} rows inserted into `{}`",
                result.rows_added, table_name
            ),
        });
        tracing::info!(table = %table_name, rows_added = result.rows_added, "import complete");

        Ok(result)
    }
}
