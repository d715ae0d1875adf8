//! Table definition builder
//!
//! Validates declared column types against a dataset and renders the
//! `CREATE TABLE` statement plus one parameterized `INSERT` per row.
//! Identifiers are backtick-quoted, which both MySQL and SQLite accept.

use std::collections::HashSet;

use indexmap::IndexMap;
use sqlkit_core::{Value, quote_identifier};

use crate::{Dataset, ImportError, Result, is_valid_column_type};

/// A column name with its declared SQL type, kept verbatim for the DDL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub declared_type: String,
}

/// Target of a foreign key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
}

impl ForeignKeyRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// Key options for a generated table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Prepend a `<table>_id INT AUTO_INCREMENT PRIMARY KEY` column.
    /// Ignored when `primary_key` is non-empty.
    pub auto_id: bool,
    /// Columns of the primary key, in key order
    pub primary_key: Option<Vec<String>>,
    /// Local column to referenced table and column, in declaration order
    pub foreign_keys: IndexMap<String, ForeignKeyRef>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            auto_id: true,
            primary_key: None,
            foreign_keys: IndexMap::new(),
        }
    }
}

impl TableOptions {
    pub fn with_auto_id(mut self, auto_id: bool) -> Self {
        self.auto_id = auto_id;
        self
    }

    pub fn with_primary_key<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.primary_key = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_foreign_key(
        mut self,
        column: impl Into<String>,
        table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        self.foreign_keys
            .insert(column.into(), ForeignKeyRef::new(table, referenced_column));
        self
    }
}

/// One row's `INSERT` statement with its named bindings
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub sql: String,
    /// Placeholder name (without `:`) and bound value, in column order
    pub params: Vec<(String, Value)>,
}

/// A validated table definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub table_name: String,
    pub columns: Vec<ColumnSpec>,
    pub primary_key: Option<Vec<String>>,
    pub foreign_keys: IndexMap<String, ForeignKeyRef>,
    auto_id: bool,
}

impl TableDefinition {
    /// Validate `declared_types` against the dataset's columns and build the definition.
    ///
    /// Fails with `SchemaMismatch` when the counts differ, then with
    /// `InvalidColumnType` for the first type whose base token is not recognized.
    pub fn build<S: AsRef<str>>(
        table_name: impl Into<String>,
        dataset: &Dataset,
        declared_types: &[S],
        options: TableOptions,
    ) -> Result<Self> {
        if declared_types.len() != dataset.columns.len() {
            return Err(ImportError::SchemaMismatch {
                declared: declared_types.len(),
                columns: dataset.columns.len(),
            });
        }

        let mut columns = Vec::with_capacity(declared_types.len());
        for (name, declared) in dataset.columns.iter().zip(declared_types) {
            let declared = declared.as_ref();
            if !is_valid_column_type(declared) {
                return Err(ImportError::InvalidColumnType {
                    column: name.clone(),
                    declared_type: declared.to_string(),
                });
            }
            columns.push(ColumnSpec {
                name: name.clone(),
                declared_type: declared.to_string(),
            });
        }

        let primary_key = options.primary_key.filter(|pk| !pk.is_empty());
        let auto_id = options.auto_id && primary_key.is_none();

        Ok(Self {
            table_name: table_name.into(),
            columns,
            primary_key,
            foreign_keys: options.foreign_keys,
            auto_id,
        })
    }

    /// Whether the synthetic id column is generated
    pub fn has_auto_id(&self) -> bool {
        self.auto_id
    }

    /// Name of the synthetic id column
    pub fn id_column_name(&self) -> String {
        format!("{}_id", self.table_name)
    }

    /// Render the `CREATE TABLE IF NOT EXISTS` statement
    pub fn create_table_sql(&self) -> String {
        let mut clauses: Vec<String> = Vec::new();

        if self.auto_id {
            clauses.push(format!(
                "    {} INT AUTO_INCREMENT PRIMARY KEY",
                quote(&self.id_column_name())
            ));
        }

        for column in &self.columns {
            clauses.push(format!("    {} {}", quote(&column.name), column.declared_type));
        }

        if let Some(pk) = &self.primary_key {
            clauses.push(format!("    PRIMARY KEY ({})", quote_list(pk)));
        }

        for (column, target) in &self.foreign_keys {
            clauses.push(format!(
                "    FOREIGN KEY ({}) REFERENCES {} ({})",
                quote(column),
                quote(&target.table),
                quote(&target.column)
            ));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            quote(&self.table_name),
            clauses.join(",\n")
        )
    }

    /// Build one `INSERT` per dataset row.
    ///
    /// The column list is the declared column order; the synthetic id is left
    /// to the database. Missing values, including NaN, bind as `Null`.
    pub fn insert_statements(&self, dataset: &Dataset) -> Vec<InsertStatement> {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        let placeholders = placeholder_names(&names);

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(&self.table_name),
            quote_list(&names),
            placeholders
                .iter()
                .map(|p| format!(":{}", p))
                .collect::<Vec<_>>()
                .join(", ")
        );

        dataset
            .rows
            .iter()
            .map(|row| InsertStatement {
                sql: sql.clone(),
                params: placeholders
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| {
                        let value = row.get(idx).cloned().unwrap_or(Value::Null);
                        (name.clone(), value.into_bindable())
                    })
                    .collect(),
            })
            .collect()
    }
}

fn quote(name: &str) -> String {
    quote_identifier("mysql", name)
}

fn quote_list<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|n| quote(n.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Derive placeholder names from column names.
///
/// Characters outside `[A-Za-z0-9_]` become `_`, names that would start with
/// a digit (or are empty) get a `p_` prefix, and collisions get `_2`, `_3`, ...
fn placeholder_names(columns: &[&str]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(columns.len());
    let mut names = Vec::with_capacity(columns.len());

    for column in columns {
        let mut base: String = column
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if base.is_empty() || base.starts_with(|c: char| c.is_ascii_digit()) {
            base.insert_str(0, "p_");
        }

        let mut name = base.clone();
        let mut n = 2;
        while used.contains(&name) {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        used.insert(name.clone());
        names.push(name);
    }

    names
}
