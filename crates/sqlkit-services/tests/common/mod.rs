//! Common test utilities and mocks

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use sqlkit_core::{
    ColumnMeta, Connection, NamedParams, QueryResult, Result, Row, SqlKitError, StatementResult,
    Value,
};

/// Mock connection for testing service-layer logic without a real database.
///
/// Every statement is logged. Statements containing a registered pattern fail
/// with a query error.
pub struct MockConnection {
    pub driver: String,
    pub query_results: Vec<QueryResult>,
    pub fail_patterns: Vec<String>,
    /// Log of all SQL executed or queried, for assertion in tests
    pub query_log: Arc<parking_lot::Mutex<Vec<String>>>,
    /// Named bindings of every `execute_named` call
    pub bindings: Arc<parking_lot::Mutex<Vec<Vec<(String, Value)>>>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            driver: "mysql".to_string(),
            query_results: vec![],
            fail_patterns: vec![],
            query_log: Arc::new(parking_lot::Mutex::new(Vec::new())),
            bindings: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    pub fn with_result(mut self, result: QueryResult) -> Self {
        self.query_results.push(result);
        self
    }

    /// Fail any statement whose SQL contains `pattern`
    pub fn failing_on(mut self, pattern: impl Into<String>) -> Self {
        self.fail_patterns.push(pattern.into());
        self
    }

    pub fn query_log(&self) -> Vec<String> {
        self.query_log.lock().clone()
    }

    pub fn bindings(&self) -> Vec<Vec<(String, Value)>> {
        self.bindings.lock().clone()
    }

    fn record(&self, sql: &str) -> Result<()> {
        self.query_log.lock().push(sql.to_string());
        if self.fail_patterns.iter().any(|p| sql.contains(p.as_str())) {
            return Err(SqlKitError::Query(format!("mock failure for: {}", sql)));
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        &self.driver
    }

    async fn execute(&self, sql: &str, _params: &[Value]) -> Result<StatementResult> {
        self.record(sql)?;
        Ok(StatementResult::default())
    }

    async fn execute_named(&self, sql: &str, params: &NamedParams) -> Result<StatementResult> {
        self.record(sql)?;
        self.bindings.lock().push(params.to_vec());
        Ok(StatementResult {
            affected_rows: 1,
            last_insert_id: None,
        })
    }

    async fn query(&self, sql: &str, _params: &[Value]) -> Result<QueryResult> {
        self.record(sql)?;
        Ok(self.query_results.first().cloned().unwrap_or_else(QueryResult::empty))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

/// Helper to create a mock QueryResult with named columns and row data
pub fn mock_query_result(column_names: Vec<&str>, row_data: Vec<Vec<Value>>) -> QueryResult {
    let columns: Vec<ColumnMeta> = column_names
        .iter()
        .enumerate()
        .map(|(i, name)| ColumnMeta {
            name: name.to_string(),
            data_type: "TEXT".to_string(),
            nullable: true,
            ordinal: i,
            max_length: None,
        })
        .collect();

    let rows: Vec<Row> = row_data
        .into_iter()
        .map(|values| Row::new(column_names.iter().map(|s| s.to_string()).collect(), values))
        .collect();

    QueryResult {
        columns,
        rows,
        affected_rows: 0,
        execution_time_ms: 0,
    }
}

/// Write `contents` to `<dir>/<name>` and return the path
pub fn write_csv(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write CSV fixture");
    path
}
