//! Table operations service
//!
//! Ad-hoc queries, table drops and table creation from CSV files.

use std::path::Path;
use std::sync::Arc;

use sqlkit_core::{Connection, QueryResult, quote_identifier};
use sqlkit_interchange::{
    CsvImportProgress, CsvImportResult, CsvImportSettings, CsvImporter, ImportPlan, TableOptions,
    plan_import,
};

use crate::error::ServiceResult;

type ProgressFn = Arc<dyn Fn(CsvImportProgress) + Send + Sync>;

/// Service for table-level operations
#[derive(Default)]
pub struct TableService {
    csv_settings: CsvImportSettings,
    progress: Option<ProgressFn>,
}

impl TableService {
    /// Create a new table service with default CSV settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different delimiter or table name for CSV imports
    pub fn with_csv_settings(mut self, settings: CsvImportSettings) -> Self {
        self.csv_settings = settings;
        self
    }

    /// Receive progress updates during CSV imports
    pub fn with_progress_callback(mut self, callback: ProgressFn) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Run a statement and return whatever rows it produces
    #[tracing::instrument(skip(self, connection, sql), fields(driver = connection.driver_name()))]
    pub async fn query(&self, connection: Arc<dyn Connection>, sql: &str) -> ServiceResult<QueryResult> {
        let result = connection.query(sql, &[]).await?;
        tracing::debug!(
            rows = result.row_count(),
            columns = result.column_count(),
            execution_time_ms = result.execution_time_ms,
            "query finished"
        );
        Ok(result)
    }

    /// Drop `table_name` if it exists. Dropping a missing table succeeds.
    ///
    /// A dotted name such as `shop.clients` is treated as `schema.table` and
    /// each part is quoted separately.
    #[tracing::instrument(skip(self, connection), fields(driver = connection.driver_name()))]
    pub async fn drop_table(&self, connection: Arc<dyn Connection>, table_name: &str) -> ServiceResult<()> {
        let driver = connection.driver_name();
        let target = table_name
            .split('.')
            .map(|part| quote_identifier(driver, part))
            .collect::<Vec<_>>()
            .join(".");
        let sql = format!("DROP TABLE IF EXISTS {}", target);
        connection.execute(&sql, &[]).await?;
        tracing::info!(table = %table_name, "table dropped (if it existed)");
        Ok(())
    }

    /// Read and validate a CSV file without touching the database
    pub fn plan_csv_import<S: AsRef<str>>(
        &self,
        path: &Path,
        declared_types: &[S],
        options: TableOptions,
    ) -> ServiceResult<ImportPlan> {
        Ok(plan_import(path, declared_types, options, &self.csv_settings)?)
    }

    /// Create a table from a CSV file and insert all of its rows.
    ///
    /// Validation happens before the first statement is sent. If a row fails
    /// to insert, the rows before it remain in the table.
    #[tracing::instrument(skip(self, connection, declared_types, options), fields(path = %path.display()))]
    pub async fn create_table_from_csv<S: AsRef<str>>(
        &self,
        connection: Arc<dyn Connection>,
        path: &Path,
        declared_types: &[S],
        options: TableOptions,
    ) -> ServiceResult<CsvImportResult> {
        let plan = self.plan_csv_import(path, declared_types, options)?;
        self.execute_import(connection, &plan).await
    }

    /// Run a plan from [`TableService::plan_csv_import`]: create the table,
    /// then insert the rows in order.
    #[tracing::instrument(skip(self, connection, plan), fields(table = %plan.table_name()))]
    pub async fn execute_import(
        &self,
        connection: Arc<dyn Connection>,
        plan: &ImportPlan,
    ) -> ServiceResult<CsvImportResult> {
        let mut importer = CsvImporter::new(connection).with_settings(self.csv_settings.clone());
        if let Some(progress) = &self.progress {
            let progress = progress.clone();
            importer = importer
                .with_progress_callback(Box::new(move |p: CsvImportProgress| progress(p)));
        }

        let result = importer.execute(plan).await?;
        tracing::info!(
            table = %result.table_name,
            rows_added = result.rows_added,
            "CSV imported"
        );
        Ok(result)
    }
}
