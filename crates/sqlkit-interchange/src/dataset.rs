//! In-memory tabular data read from CSV

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use sqlkit_core::Value;

use crate::{ImportError, Result};

/// Cell contents treated as a missing value
pub const NA_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Ordered columns plus rows of values parallel to them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Column names, unique, in file order
    pub columns: Vec<String>,
    /// One entry per data row, each as long as `columns`
    pub rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Create a dataset from already-typed rows
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Read a CSV file with a header row
    pub fn from_path(path: &Path, delimiter: u8) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_reader(file, delimiter)?;
        tracing::debug!(
            path = %path.display(),
            columns = dataset.columns.len(),
            rows = dataset.rows.len(),
            "read CSV file"
        );
        Ok(dataset)
    }

    /// Read CSV data with a header row from any reader.
    ///
    /// Duplicate header names get `.1`, `.2`, ... suffixes. A record whose
    /// field count differs from the header is an error.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let columns = dedupe_headers(headers);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(parse_cell).collect());
        }

        Ok(Self { columns, rows })
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Type a single CSV cell.
///
/// Missing markers become `Null`; then booleans, integers and floats are
/// tried in that order, and anything else stays a string.
pub fn parse_cell(cell: &str) -> Value {
    if NA_MARKERS.contains(&cell) {
        return Value::Null;
    }
    match cell {
        "True" | "TRUE" | "true" => return Value::Bool(true),
        "False" | "FALSE" | "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::Int64(i);
    }
    if let Ok(f) = cell.parse::<f64>() {
        return Value::Float64(f);
    }
    Value::String(cell.to_string())
}

fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut columns = Vec::with_capacity(headers.len());

    for header in headers {
        let mut name = header.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", header, suffix);
            suffix += 1;
        }
        seen.insert(name.clone());
        columns.push(name);
    }

    columns
}
