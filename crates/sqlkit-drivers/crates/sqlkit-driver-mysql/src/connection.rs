//! MySQL connection implementation

use async_trait::async_trait;
use chrono::{Datelike, Timelike};
use mysql_async::{
    Conn, Opts, OptsBuilder, Params, Pool, PoolConstraints, PoolOpts, Row as MySqlRow,
    consts::ColumnType, prelude::*,
};
use sqlkit_core::{
    ColumnMeta, Connection, NamedParams, QueryResult, Result, Row, SqlKitError, StatementResult,
    Value,
};
use std::sync::atomic::{AtomicBool, Ordering};

/// MySQL connection wrapper
///
/// Backed by a single-connection pool. The server runs in autocommit mode, so
/// each statement is committed as soon as it succeeds.
pub struct MySqlConnection {
    pool: Pool,
    closed: AtomicBool,
}

impl MySqlConnection {
    /// Connect to a MySQL database
    pub async fn connect(
        host: &str,
        port: u16,
        database: Option<&str>,
        user: Option<&str>,
        password: &str,
    ) -> Result<Self> {
        tracing::info!(host = %host, port = %port, database = ?database, "connecting to MySQL database");

        let mut opts_builder = OptsBuilder::from_opts(Opts::default())
            .ip_or_hostname(host)
            .tcp_port(port)
            .pass(Some(password));

        if let Some(db) = database {
            opts_builder = opts_builder.db_name(Some(db));
        }
        if let Some(u) = user {
            opts_builder = opts_builder.user(Some(u));
        }

        let constraints = PoolConstraints::new(1, 1).ok_or_else(|| {
            SqlKitError::Connection("Failed to configure MySQL pool constraints (min=1, max=1)".into())
        })?;
        let pool_opts = PoolOpts::default()
            .with_constraints(constraints)
            .with_reset_connection(false);
        opts_builder = opts_builder.pool_opts(pool_opts);

        let pool = Pool::new(Opts::from(opts_builder));

        // Acquire and release one connection so bad credentials fail here
        // rather than on the first statement.
        let conn = pool
            .get_conn()
            .await
            .map_err(|e| SqlKitError::Connection(format!("Failed to connect to MySQL: {}", e)))?;
        drop(conn);

        tracing::info!(host = %host, port = %port, database = ?database, "MySQL connection established");
        Ok(Self {
            pool,
            closed: AtomicBool::new(false),
        })
    }

    async fn get_conn(&self) -> Result<Conn> {
        if self.is_closed() {
            return Err(SqlKitError::Connection("MySQL connection is closed".into()));
        }
        self.pool
            .get_conn()
            .await
            .map_err(|e| SqlKitError::Connection(format!("Failed to get MySQL connection: {}", e)))
    }

    async fn run_statement(&self, sql: &str, params: Params) -> Result<StatementResult> {
        let mut conn = self.get_conn().await?;

        // Parameterless statements go through the text protocol: several DDL
        // statements cannot be prepared.
        if matches!(params, Params::Empty) {
            conn.query_drop(sql)
                .await
                .map_err(|e| SqlKitError::Query(format!("Failed to execute statement: {}", e)))?;
        } else {
            conn.exec_drop(sql, params)
                .await
                .map_err(|e| SqlKitError::Query(format!("Failed to execute statement: {}", e)))?;
        }

        let result = StatementResult {
            affected_rows: conn.affected_rows(),
            last_insert_id: conn.last_insert_id(),
        };
        tracing::debug!(affected_rows = result.affected_rows, "statement executed");
        Ok(result)
    }
}

fn positional_params(params: &[Value]) -> Params {
    if params.is_empty() {
        Params::Empty
    } else {
        Params::Positional(params.iter().map(value_to_mysql).collect())
    }
}

fn named_params(params: &NamedParams) -> Params {
    if params.is_empty() {
        Params::Empty
    } else {
        Params::from(
            params
                .iter()
                .map(|(name, value)| (name.clone(), value_to_mysql(value)))
                .collect::<Vec<(String, mysql_async::Value)>>(),
        )
    }
}

/// Convert our Value type to a mysql_async value for binding
fn value_to_mysql(value: &Value) -> mysql_async::Value {
    match value {
        Value::Null => mysql_async::Value::NULL,
        Value::Bool(v) => mysql_async::Value::Int(i64::from(*v)),
        Value::Int64(v) => mysql_async::Value::Int(*v),
        Value::Float64(v) if v.is_nan() => mysql_async::Value::NULL,
        Value::Float64(v) => mysql_async::Value::Double(*v),
        Value::Decimal(v) | Value::String(v) => mysql_async::Value::Bytes(v.as_bytes().to_vec()),
        Value::Bytes(v) => mysql_async::Value::Bytes(v.clone()),
        Value::Date(d) => {
            mysql_async::Value::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0)
        }
        Value::Time(t) => mysql_async::Value::Time(
            false,
            0,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
            t.nanosecond() / 1_000,
        ),
        Value::DateTime(dt) => mysql_async::Value::Date(
            dt.year() as u16,
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
            dt.nanosecond() / 1_000,
        ),
        Value::Json(v) => mysql_async::Value::Bytes(v.to_string().into_bytes()),
    }
}

/// Convert mysql_async Value to our Value type, using column type metadata
/// to correctly interpret byte strings from the text protocol.
fn mysql_value_to_value(val: mysql_async::Value, col_type: ColumnType) -> Value {
    match val {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => match col_type {
                ColumnType::MYSQL_TYPE_TINY
                | ColumnType::MYSQL_TYPE_SHORT
                | ColumnType::MYSQL_TYPE_LONG
                | ColumnType::MYSQL_TYPE_LONGLONG
                | ColumnType::MYSQL_TYPE_INT24
                | ColumnType::MYSQL_TYPE_YEAR => {
                    s.parse::<i64>().map(Value::Int64).unwrap_or(Value::String(s))
                }
                ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => {
                    s.parse::<f64>().map(Value::Float64).unwrap_or(Value::String(s))
                }
                ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
                    Value::Decimal(s)
                }
                ColumnType::MYSQL_TYPE_JSON => serde_json::from_str(&s)
                    .map(Value::Json)
                    .unwrap_or(Value::String(s)),
                _ => Value::String(s),
            },
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        mysql_async::Value::Int(i) => Value::Int64(i),
        mysql_async::Value::UInt(u) => {
            if u <= i64::MAX as u64 {
                Value::Int64(u as i64)
            } else {
                Value::Decimal(u.to_string())
            }
        }
        mysql_async::Value::Float(f) => Value::Float64(f as f64),
        mysql_async::Value::Double(d) => Value::Float64(d),
        mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
            let date = chrono::NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32);
            if hour == 0 && min == 0 && sec == 0 && micro == 0 {
                match date {
                    Some(date) => Value::Date(date),
                    None => Value::String(format!("{:04}-{:02}-{:02}", year, month, day)),
                }
            } else {
                match date.and_then(|d| {
                    d.and_hms_micro_opt(hour as u32, min as u32, sec as u32, micro)
                }) {
                    Some(dt) => Value::DateTime(dt),
                    None => Value::String(format!(
                        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                        year, month, day, hour, min, sec
                    )),
                }
            }
        }
        mysql_async::Value::Time(negative, days, hours, mins, secs, micros) => {
            let total_hours = days * 24 + hours as u32;
            let sign = if negative { "-" } else { "" };
            Value::String(format!(
                "{}{:02}:{:02}:{:02}.{:06}",
                sign, total_hours, mins, secs, micros
            ))
        }
    }
}

fn rows_to_result(mysql_rows: Vec<MySqlRow>) -> (Vec<ColumnMeta>, Vec<Row>) {
    let mut columns = Vec::new();
    let mut column_names = Vec::new();
    let mut column_types = Vec::new();

    if let Some(first_row) = mysql_rows.first() {
        for (idx, col) in first_row.columns_ref().iter().enumerate() {
            let name = col.name_str().to_string();
            column_names.push(name.clone());
            column_types.push(col.column_type());
            columns.push(ColumnMeta {
                name,
                data_type: format!("{:?}", col.column_type()),
                nullable: true,
                ordinal: idx,
                max_length: Some(col.column_length() as i64),
            });
        }
    }

    let rows = mysql_rows
        .into_iter()
        .map(|mysql_row| {
            let values = (0..columns.len())
                .map(|idx| {
                    let mysql_val: mysql_async::Value =
                        mysql_row.get(idx).unwrap_or(mysql_async::Value::NULL);
                    let col_type = column_types
                        .get(idx)
                        .copied()
                        .unwrap_or(ColumnType::MYSQL_TYPE_STRING);
                    mysql_value_to_value(mysql_val, col_type)
                })
                .collect();
            Row::new(column_names.clone(), values)
        })
        .collect();

    (columns, rows)
}

#[async_trait]
impl Connection for MySqlConnection {
    fn driver_name(&self) -> &str {
        "mysql"
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        self.run_statement(sql, positional_params(params)).await
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute_named(&self, sql: &str, params: &NamedParams) -> Result<StatementResult> {
        self.run_statement(sql, named_params(params)).await
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();
        let mut conn = self.get_conn().await?;

        let mysql_rows: Vec<MySqlRow> = match positional_params(params) {
            Params::Empty => conn.query(sql).await,
            bound => conn.exec(sql, bound).await,
        }
        .map_err(|e| SqlKitError::Query(format!("Failed to execute query: {}", e)))?;

        let (columns, rows) = rows_to_result(mysql_rows);
        let execution_time_ms = start_time.elapsed().as_millis() as u64;

        tracing::debug!(
            row_count = rows.len(),
            execution_time_ms = execution_time_ms,
            "query executed successfully"
        );

        Ok(QueryResult {
            columns,
            rows,
            affected_rows: conn.affected_rows(),
            execution_time_ms,
        })
    }

    async fn close(&self) -> Result<()> {
        tracing::info!("closing MySQL connection pool");
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.pool
            .clone()
            .disconnect()
            .await
            .map_err(|e| SqlKitError::Connection(format!("Failed to close MySQL connection: {}", e)))
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
