//! Connection trait

use crate::{QueryResult, Result, StatementResult, Value};
use async_trait::async_trait;

/// Named bindings for a statement, in placeholder order.
///
/// Names are stored without the `:` prefix; drivers add whatever prefix their
/// client library expects.
pub type NamedParams = [(String, Value)];

/// A database connection
///
/// Every statement runs in autocommit mode: a successful `execute` is durable
/// on its own and is not rolled back by a later failure.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "sqlite", "mysql")
    fn driver_name(&self) -> &str;

    /// Execute a statement that modifies data or structure (DDL, INSERT, DROP)
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult>;

    /// Execute a statement whose placeholders are named (`:name`)
    async fn execute_named(&self, sql: &str, params: &NamedParams) -> Result<StatementResult>;

    /// Execute a query that returns rows (SELECT)
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}

/// Quote an identifier for the given driver.
///
/// MySQL uses backticks; every other supported driver uses double quotes.
/// SQLite also accepts backticks, which is why generated DDL can target both.
pub fn quote_identifier(driver: &str, name: &str) -> String {
    if driver == "mysql" {
        format!("`{}`", name.replace('`', "``"))
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}
