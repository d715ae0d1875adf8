//! Terminal rendering for query results and import plans

use clap::ValueEnum;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use sqlkit_core::{QueryResult, Value};
use sqlkit_services::ImportPlan;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn render_query_result(result: &QueryResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(result)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&result_to_json(result))?),
    }
}

fn render_table(result: &QueryResult) -> String {
    if result.columns.is_empty() {
        return format!("({} rows affected)", result.affected_rows);
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(result.column_names());

    for row in &result.rows {
        table.add_row(
            (0..result.columns.len())
                .map(|i| row.get(i).map(Value::to_string).unwrap_or_default())
                .collect::<Vec<_>>(),
        );
    }

    let noun = if result.rows.len() == 1 { "row" } else { "rows" };
    format!("{table}\n({} {})", result.rows.len(), noun)
}

/// Rows as an array of objects keyed by column name
fn result_to_json(result: &QueryResult) -> serde_json::Value {
    let rows = result
        .rows
        .iter()
        .map(|row| {
            let object = result
                .columns
                .iter()
                .enumerate()
                .map(|(i, col)| {
                    let value = row.get(i).map(value_to_json).unwrap_or(serde_json::Value::Null);
                    (col.name.clone(), value)
                })
                .collect::<serde_json::Map<_, _>>();
            serde_json::Value::Object(object)
        })
        .collect();
    serde_json::Value::Array(rows)
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int64(i) => serde_json::Value::from(*i),
        Value::Float64(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Json(j) => j.clone(),
        other => serde_json::Value::String(other.to_string()),
    }
}

/// DDL plus a summary of the inserts, for `import --dry-run`
pub fn render_plan(plan: &ImportPlan) -> String {
    let mut out = format!("{};\n", plan.create_sql);
    match plan.inserts.first() {
        Some(first) => {
            out.push_str(&format!(
                "-- {} INSERT statement(s) into `{}`, e.g.:\n{};\n",
                plan.row_count(),
                plan.table_name(),
                first.sql
            ));
        }
        None => out.push_str("-- no rows to insert\n"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlkit_core::{ColumnMeta, Row};

    fn sample() -> QueryResult {
        let names = vec!["name".to_string(), "age".to_string()];
        QueryResult {
            columns: names
                .iter()
                .enumerate()
                .map(|(i, n)| ColumnMeta {
                    name: n.clone(),
                    data_type: "TEXT".into(),
                    nullable: true,
                    ordinal: i,
                    max_length: None,
                })
                .collect(),
            rows: vec![
                Row::new(names.clone(), vec![Value::String("Alice".into()), Value::Int64(28)]),
                Row::new(names, vec![Value::String("Bob".into()), Value::Null]),
            ],
            affected_rows: 0,
            execution_time_ms: 1,
        }
    }

    #[test]
    fn json_output_is_array_of_objects() {
        let rendered = render_query_result(&sample(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([
                {"name": "Alice", "age": 28},
                {"name": "Bob", "age": null}
            ])
        );
    }

    #[test]
    fn table_output_lists_cells_and_count() {
        let rendered = render_query_result(&sample(), OutputFormat::Table).unwrap();
        assert!(rendered.contains("Alice"));
        assert!(rendered.contains("NULL"));
        assert!(rendered.ends_with("(2 rows)"));
    }

    #[test]
    fn statement_without_columns_reports_affected_rows() {
        let result = QueryResult {
            affected_rows: 3,
            ..Default::default()
        };
        assert_eq!(render_table(&result), "(3 rows affected)");
    }

    #[test]
    fn nan_float_is_json_null() {
        assert_eq!(value_to_json(&Value::Float64(f64::NAN)), serde_json::Value::Null);
        assert_eq!(value_to_json(&Value::Float64(1.5)), serde_json::json!(1.5));
    }
}
