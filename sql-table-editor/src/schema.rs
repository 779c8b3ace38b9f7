//! Schema and row types for dynamic database introspection
//!
//! These types represent table structure discovered at runtime and the
//! materialized rows loaded from it. Nothing here knows a table's columns
//! ahead of time.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

/// Complete schema information for a database table
///
/// A snapshot: it is rediscovered every time a table is selected, edited or
/// deleted from, so that external schema changes are picked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    /// Name of the table
    pub name: String,

    /// Columns in declaration order
    pub columns: Vec<ColumnDefinition>,

    /// Primary key column names in key order (empty when the store reports none)
    pub primary_key: Vec<String>,
}

impl TableSchema {
    /// Look up a column by its exact name
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    /// Whether the store reported a primary key for this table
    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }
}

/// Information about a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Column name, never empty and unique within its table
    pub name: String,

    /// Normalized data type
    pub data_type: DataType,

    /// Type as declared in the table definition (e.g. "VARCHAR(255)")
    pub declared_type: String,

    /// Whether the column allows NULL values
    pub nullable: bool,

    /// Whether the store assigns this column's value itself
    pub is_auto_generated: bool,

    /// Whether this column is part of the primary key
    pub is_primary_key: bool,
}

/// Normalized column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataType {
    Text,
    Integer,
    Real,
    Boolean,
    Date,
    Binary,
    Other,
}

impl DataType {
    /// Map a declared SQL type onto a data type
    ///
    /// Follows SQLite's affinity rules, checked in this order, with boolean
    /// and date/time names recognised ahead of them.
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.trim().to_ascii_uppercase();

        if upper.is_empty() || upper.contains("BLOB") {
            return DataType::Binary;
        }
        if upper.starts_with("BOOL") || upper == "BIT" || upper == "YESNO" {
            return DataType::Boolean;
        }
        if upper.contains("INT") {
            return DataType::Integer;
        }
        if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            return DataType::Text;
        }
        if upper.contains("DATE") || upper.contains("TIME") {
            return DataType::Date;
        }
        if upper.contains("REAL")
            || upper.contains("FLOA")
            || upper.contains("DOUB")
            || upper.contains("NUMERIC")
            || upper.contains("DECIMAL")
        {
            return DataType::Real;
        }

        DataType::Other
    }
}

/// A single typed cell value
///
/// Serialized untagged so rows travel as plain JSON objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// String rendering used for filtering, filter candidates and text form fields
    ///
    /// NULL renders as the empty string. Blobs render as a SQLite hex literal
    /// (`x'0a1b'`) that [`parse_blob_literal`] reads back.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(value) => value.to_string(),
            Value::Integer(value) => value.to_string(),
            Value::Real(value) => value.to_string(),
            Value::Text(value) => value.clone(),
            Value::Blob(value) => blob_literal(value),
        }
    }

    /// The store's boolean conversion
    ///
    /// Integers are true when non-zero; text accepts `true`, `yes`, `on` and
    /// `1` (and their negative forms) case-insensitively. Anything else has
    /// no boolean reading.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            Value::Integer(value) => Some(*value != 0),
            Value::Real(value) => Some(*value != 0.0),
            Value::Text(value) => parse_bool(value),
            Value::Null | Value::Blob(_) => None,
        }
    }

    /// Native comparison order
    ///
    /// NULL sorts first. Numbers compare numerically across integer and real,
    /// same-kind values compare natively, and mixed kinds fall back to
    /// comparing their string renderings.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Boolean(left), Value::Boolean(right)) => left.cmp(right),
            (Value::Integer(left), Value::Integer(right)) => left.cmp(right),
            (Value::Real(left), Value::Real(right)) => left.total_cmp(right),
            (Value::Integer(left), Value::Real(right)) => (*left as f64).total_cmp(right),
            (Value::Real(left), Value::Integer(right)) => left.total_cmp(&(*right as f64)),
            (Value::Text(left), Value::Text(right)) => left.cmp(right),
            (Value::Blob(left), Value::Blob(right)) => left.cmp(right),
            _ => self.render().cmp(&other.render()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.render())
    }
}

/// Parse the textual boolean forms accepted by the store
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn blob_literal(bytes: &[u8]) -> String {
    let mut literal = String::with_capacity(bytes.len() * 2 + 3);
    literal.push_str("x'");
    for byte in bytes {
        let _ = write!(literal, "{byte:02x}");
    }
    literal.push('\'');
    literal
}

/// Read a hex blob literal such as `x'0a1b'` (either case of `x`)
pub fn parse_blob_literal(text: &str) -> Option<Vec<u8>> {
    let hex = text
        .strip_prefix("x'")
        .or_else(|| text.strip_prefix("X'"))?
        .strip_suffix('\'')?;
    if hex.len() % 2 != 0 || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }

    (0..hex.len())
        .step_by(2)
        .map(|start| u8::from_str_radix(&hex[start..start + 2], 16).ok())
        .collect()
}

/// One materialized row: column name to value
///
/// A plain value type; cloning never shares state with the row set it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Value of a column, treating an absent column as NULL
    pub fn value_or_null(&self, column: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.0.get(column).unwrap_or(&NULL)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(column, value)| (column.into(), value)).collect())
    }
}

/// Materialized result of loading a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSet {
    /// Table the rows were loaded from
    pub table: String,

    /// Column names in store order
    pub columns: Vec<String>,

    /// The rows, in load order
    pub rows: Vec<Row>,
}

/// How a row identity was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentityStrategy {
    /// Primary-key column(s) only
    PrimaryKey,
    /// Every non-auto-generated column; may match duplicate rows
    FullRow,
}

/// One captured column/value pair of a row identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityColumn {
    pub column: String,
    pub value: Value,
}

/// Column/value pairs locating a row for update or delete
///
/// Captured from the displayed row when the user opens the edit or delete
/// action and carried unchanged to execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowIdentity {
    pub strategy: IdentityStrategy,
    pub columns: Vec<IdentityColumn>,
}

/// A user-entered value for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Text(String),
}

/// Column name to user-entered value, as consumed by insert and update
pub type FieldValueMap = BTreeMap<String, FieldValue>;

/// Sort order for row projections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Response from listing tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablesResponse {
    /// Database file the tables belong to
    pub database_path: String,

    /// User table names
    pub tables: Vec<String>,
}
