//! SQLite connection implementation

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, OpenFlags, ToSql, params_from_iter};
use sqlkit_core::{
    ColumnMeta, Connection, NamedParams, QueryResult, Result, Row, SqlKitError, StatementResult,
    Value,
};
use std::sync::atomic::{AtomicBool, Ordering};

/// SQLite connection wrapper
pub struct SqliteConnection {
    conn: Mutex<RusqliteConnection>,
    closed: AtomicBool,
}

impl SqliteConnection {
    /// Open a SQLite database. `:memory:` opens a private in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        tracing::info!(path = %path, "opening SQLite database");

        let conn = if path == ":memory:" {
            RusqliteConnection::open_in_memory().map_err(|e| {
                SqlKitError::Connection(format!("Failed to open in-memory database: {}", e))
            })?
        } else {
            if !path.starts_with("file:") {
                let file_path = std::path::Path::new(path);
                if let Some(parent) = file_path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        return Err(SqlKitError::Connection(format!(
                            "Parent directory does not exist: {}",
                            parent.display()
                        )));
                    }
                }
            }

            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            RusqliteConnection::open_with_flags(path, flags).map_err(|e| {
                SqlKitError::Connection(format!(
                    "Failed to open SQLite database at '{}': {}",
                    path, e
                ))
            })?
        };

        // Foreign key clauses in generated DDL are only enforced with this on
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| SqlKitError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        tracing::info!(path = %path, "SQLite database connection established");
        Ok(Self {
            conn: Mutex::new(conn),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(SqlKitError::Connection("SQLite connection is closed".into()))
        } else {
            Ok(())
        }
    }

    fn statement_result(conn: &RusqliteConnection, affected: usize) -> StatementResult {
        let rowid = conn.last_insert_rowid();
        StatementResult {
            affected_rows: affected as u64,
            last_insert_id: u64::try_from(rowid).ok().filter(|id| *id > 0),
        }
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        self.ensure_open()?;
        let conn = self.conn.lock();
        let rusqlite_params = values_to_rusqlite(params);

        let rows_affected = conn
            .execute(sql, params_from_iter(rusqlite_params.iter()))
            .map_err(|e| SqlKitError::Query(format!("Failed to execute statement: {}", e)))?;

        tracing::debug!(affected_rows = rows_affected, "statement executed");
        Ok(Self::statement_result(&conn, rows_affected))
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute_named(&self, sql: &str, params: &NamedParams) -> Result<StatementResult> {
        self.ensure_open()?;
        let conn = self.conn.lock();

        let owned: Vec<(String, rusqlite::types::Value)> = params
            .iter()
            .map(|(name, value)| (format!(":{}", name), value_to_rusqlite(value)))
            .collect();
        let bound: Vec<(&str, &dyn ToSql)> = owned
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect();

        let rows_affected = conn
            .execute(sql, bound.as_slice())
            .map_err(|e| SqlKitError::Query(format!("Failed to execute statement: {}", e)))?;

        tracing::debug!(affected_rows = rows_affected, "statement executed");
        Ok(Self::statement_result(&conn, rows_affected))
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.ensure_open()?;
        let start_time = std::time::Instant::now();

        let conn = self.conn.lock();
        let rusqlite_params = values_to_rusqlite(params);

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| SqlKitError::Query(format!("Failed to prepare query: {}", e)))?;

        let mut column_names: Vec<String> = Vec::with_capacity(stmt.column_count());
        let mut columns: Vec<ColumnMeta> = Vec::with_capacity(stmt.column_count());
        for (idx, col) in stmt.columns().iter().enumerate() {
            let name = col.name().to_string();
            // sqlite3_column_decltype: the type written in CREATE TABLE
            let data_type = col.decl_type().unwrap_or("DYNAMIC").to_string();
            column_names.push(name.clone());
            columns.push(ColumnMeta {
                name,
                data_type,
                nullable: true,
                ordinal: idx,
                max_length: None,
            });
        }

        let mut rows = Vec::new();
        let mut query_rows = stmt
            .query(params_from_iter(rusqlite_params.iter()))
            .map_err(|e| SqlKitError::Query(format!("Failed to execute query: {}", e)))?;

        while let Some(row) = query_rows
            .next()
            .map_err(|e| SqlKitError::Query(format!("Failed to fetch row: {}", e)))?
        {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(rusqlite_to_value(row, i)?);
            }
            rows.push(Row::new(column_names.clone(), values));
        }

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(
            row_count = rows.len(),
            execution_time_ms = execution_time_ms,
            "query executed successfully"
        );
        Ok(QueryResult {
            columns,
            rows,
            affected_rows: 0,
            execution_time_ms,
        })
    }

    async fn close(&self) -> Result<()> {
        tracing::info!("closing SQLite connection");
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Convert our Value types to rusqlite-compatible types
fn values_to_rusqlite(values: &[Value]) -> Vec<rusqlite::types::Value> {
    values.iter().map(value_to_rusqlite).collect()
}

fn value_to_rusqlite(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(i64::from(*b)),
        Value::Int64(i) => rusqlite::types::Value::Integer(*i),
        Value::Float64(f) if f.is_nan() => rusqlite::types::Value::Null,
        Value::Float64(f) => rusqlite::types::Value::Real(*f),
        Value::Decimal(d) => rusqlite::types::Value::Text(d.clone()),
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Bytes(b) => rusqlite::types::Value::Blob(b.clone()),
        Value::Date(d) => rusqlite::types::Value::Text(d.to_string()),
        Value::Time(t) => rusqlite::types::Value::Text(t.to_string()),
        Value::DateTime(dt) => rusqlite::types::Value::Text(dt.to_string()),
        Value::Json(j) => rusqlite::types::Value::Text(j.to_string()),
    }
}

/// Convert rusqlite row value to our Value type
fn rusqlite_to_value(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row
        .get_ref(idx)
        .map_err(|e| SqlKitError::Query(e.to_string()))?;

    let value = match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => match std::str::from_utf8(b) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => Value::Bytes(b.to_vec()),
        },
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn named_params_bind_by_name() {
        let conn = SqliteConnection::open(":memory:").expect("open in-memory db");
        conn.execute("CREATE TABLE people (name TEXT, age INT)", &[])
            .await
            .expect("create table");

        let params = vec![
            ("age".to_string(), Value::Null),
            ("name".to_string(), Value::String("Bob".into())),
        ];
        let result = conn
            .execute_named("INSERT INTO people (name, age) VALUES (:name, :age)", &params)
            .await
            .expect("insert");
        assert_eq!(result.affected_rows, 1);
        assert_eq!(result.last_insert_id, Some(1));

        let rows = conn
            .query("SELECT name, age FROM people", &[])
            .await
            .expect("select");
        assert_eq!(rows.row_count(), 1);
        assert_eq!(rows.rows[0].get_by_name("name"), Some(&Value::String("Bob".into())));
        assert_eq!(rows.rows[0].get_by_name("age"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn positional_params_and_decl_types() {
        let conn = SqliteConnection::open(":memory:").expect("open in-memory db");
        conn.execute("CREATE TABLE t (v VARCHAR(10), n DOUBLE)", &[])
            .await
            .expect("create table");
        conn.execute(
            "INSERT INTO t (v, n) VALUES (?, ?)",
            &[Value::String("x".into()), Value::Float64(f64::NAN)],
        )
        .await
        .expect("insert");

        let result = conn.query("SELECT v, n FROM t WHERE v = ?", &[Value::String("x".into())])
            .await
            .expect("select");
        assert_eq!(result.columns[0].data_type, "VARCHAR(10)");
        assert_eq!(result.rows[0].get(1), Some(&Value::Null));
    }

    #[tokio::test]
    async fn constraint_violation_is_a_query_error() {
        let conn = SqliteConnection::open(":memory:").expect("open in-memory db");
        conn.execute("CREATE TABLE t (id INT PRIMARY KEY)", &[])
            .await
            .expect("create table");
        conn.execute("INSERT INTO t VALUES (1)", &[]).await.expect("first insert");
        let err = conn
            .execute("INSERT INTO t VALUES (1)", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SqlKitError::Query(_)));
        assert!(err.is_store_error());
    }

    #[tokio::test]
    async fn closed_connection_rejects_statements() {
        let conn = SqliteConnection::open(":memory:").expect("open in-memory db");
        conn.close().await.expect("close");
        assert!(conn.is_closed());
        assert!(conn.query("SELECT 1", &[]).await.is_err());
    }

    #[test]
    fn missing_parent_directory_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope").join("db.sqlite");
        let err = SqliteConnection::open(path.to_str().unwrap()).err().unwrap();
        assert!(err.to_string().contains("Parent directory does not exist"));
    }
}
