//! Recognized column types
//!
//! Declared types are checked by their base token only: the text before the
//! first `(`, uppercased. Length, precision and enum members are passed
//! through to the DDL untouched.

/// Base type names accepted in a column declaration
pub const COLUMN_TYPES: [&str; 24] = [
    "TINYINT",
    "SMALLINT",
    "MEDIUMINT",
    "INT",
    "INTEGER",
    "BIGINT",
    "DECIMAL",
    "NUMERIC",
    "FLOAT",
    "DOUBLE",
    "DATE",
    "DATETIME",
    "TIMESTAMP",
    "TIME",
    "YEAR",
    "CHAR",
    "VARCHAR",
    "TEXT",
    "TINYTEXT",
    "MEDIUMTEXT",
    "LONGTEXT",
    "BLOB",
    "ENUM",
    "JSON",
];

/// Extract the base token of a declared type: `varchar(255)` becomes `VARCHAR`.
///
/// Surrounding whitespace is not trimmed, so `" INT"` has base token `" INT"`
/// and is rejected.
pub fn base_type(declared: &str) -> String {
    declared
        .split('(')
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

/// Check whether a declared type's base token is in [`COLUMN_TYPES`]
pub fn is_valid_column_type(declared: &str) -> bool {
    let base = base_type(declared);
    COLUMN_TYPES.contains(&base.as_str())
}
