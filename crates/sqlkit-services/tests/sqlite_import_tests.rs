//! End-to-end CSV imports against an in-memory SQLite database

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use sqlkit_core::{Connection, SqlKitError, Value};
use sqlkit_drivers::sqlite::SqliteConnection;
use sqlkit_interchange::ImportError;
use sqlkit_services::{ServiceError, TableOptions, TableService};

use common::write_csv;

fn memory_db() -> Arc<dyn Connection> {
    Arc::new(SqliteConnection::open(":memory:").expect("Failed to open in-memory db"))
}

async fn column_values(conn: &Arc<dyn Connection>, sql: &str) -> Vec<Vec<Value>> {
    conn.query(sql, &[])
        .await
        .expect("Failed to query")
        .rows
        .into_iter()
        .map(|row| (0..row.columns().len()).filter_map(|i| row.get(i).cloned()).collect())
        .collect()
}

#[tokio::test]
async fn import_creates_table_and_inserts_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "people.csv", "name,age,active\nAlice,28,True\nBob,NA,False\n");
    let conn = memory_db();
    let service = TableService::new();

    let result = service
        .create_table_from_csv(
            conn.clone(),
            &path,
            &["VARCHAR(50)", "INT", "TINYINT"],
            TableOptions::default(),
        )
        .await
        .expect("Failed to import");
    assert_eq!(result.rows_added, 2);

    assert_eq!(
        column_values(&conn, "SELECT name, age, active FROM people ORDER BY rowid").await,
        vec![
            vec![Value::String("Alice".into()), Value::Int64(28), Value::Int64(1)],
            vec![Value::String("Bob".into()), Value::Null, Value::Int64(0)],
        ]
    );

    let ddl = column_values(
        &conn,
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'people'",
    )
    .await;
    let Value::String(ddl) = &ddl[0][0] else {
        panic!("expected DDL text, got {:?}", ddl);
    };
    assert!(ddl.contains("`people_id` INT AUTO_INCREMENT PRIMARY KEY"));
}

#[tokio::test]
async fn failure_on_row_k_leaves_earlier_rows_committed() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "items.csv", "id,label\n1,a\n2,b\n2,dup\n3,c\n");
    let conn = memory_db();

    let err = TableService::new()
        .create_table_from_csv(
            conn.clone(),
            &path,
            &["INT", "TEXT"],
            TableOptions::default().with_primary_key(["id"]),
        )
        .await
        .unwrap_err();

    match &err {
        ServiceError::Import(ImportError::Store { row, source }) => {
            assert_eq!(*row, 3);
            assert!(matches!(source, SqlKitError::Query(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_store());

    assert_eq!(
        column_values(&conn, "SELECT id, label FROM items ORDER BY id").await,
        vec![
            vec![Value::Int64(1), Value::String("a".into())],
            vec![Value::Int64(2), Value::String("b".into())],
        ]
    );
}

#[tokio::test]
async fn foreign_keys_are_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let clients = write_csv(&dir, "clients.csv", "id,name\n1,Acme\n");
    let orders = write_csv(&dir, "orders.csv", "client_id,amount\n1,10.5\n9,3.0\n");
    let conn = memory_db();
    let service = TableService::new();

    service
        .create_table_from_csv(
            conn.clone(),
            &clients,
            &["INT", "VARCHAR(20)"],
            TableOptions::default().with_primary_key(["id"]),
        )
        .await
        .expect("Failed to import clients");

    let err = service
        .create_table_from_csv(
            conn.clone(),
            &orders,
            &["INT", "DOUBLE"],
            TableOptions::default().with_foreign_key("client_id", "clients", "id"),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("failed to insert row 2"), "{err}");

    assert_eq!(
        column_values(&conn, "SELECT client_id, amount FROM orders").await,
        vec![vec![Value::Int64(1), Value::Float64(10.5)]]
    );
}

#[tokio::test]
async fn import_twice_appends_to_existing_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "notes.csv", "body\nhello\n");
    let conn = memory_db();
    let service = TableService::new();

    for _ in 0..2 {
        service
            .create_table_from_csv(conn.clone(), &path, &["TEXT"], TableOptions::default())
            .await
            .expect("Failed to import");
    }

    assert_eq!(
        column_values(&conn, "SELECT COUNT(*) FROM notes").await,
        vec![vec![Value::Int64(2)]]
    );
}

#[tokio::test]
async fn drop_table_then_query_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "scratch.csv", "x\n1\n");
    let conn = memory_db();
    let service = TableService::new();

    service
        .create_table_from_csv(conn.clone(), &path, &["INT"], TableOptions::default())
        .await
        .expect("Failed to import");
    service.drop_table(conn.clone(), "scratch").await.expect("Failed to drop");
    service
        .drop_table(conn.clone(), "scratch")
        .await
        .expect("Dropping a missing table should succeed");

    let err = service.query(conn, "SELECT * FROM scratch").await.unwrap_err();
    assert!(err.is_store());
}
