//! SQLite database provider implementation

use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::schema::{ColumnDefinition, DataType, Row, TableSchema, Value};
use crate::sql::{quote_identifier, Statement};
use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteColumn, SqliteConnectOptions, SqliteConnection, SqliteRow,
};
use sqlx::{Column, Connection, Row as _, Sqlite, TypeInfo, ValueRef};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const LIST_TABLES_QUERY: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' ORDER BY name";

const TABLE_DEFINITION_QUERY: &str =
    "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?";

/// SQLite database provider
///
/// Opens the database file anew for every call. The file is never created.
pub struct SqliteProvider {
    location: String,
    options: SqliteConnectOptions,
}

impl SqliteProvider {
    /// Create a new SQLite provider
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the database file
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path: PathBuf = path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(false);

        Self {
            location: path.display().to_string(),
            options,
        }
    }

    async fn connect(&self) -> Result<SqliteConnection, DatabaseError> {
        SqliteConnection::connect_with(&self.options)
            .await
            .map_err(|error| {
                DatabaseError::Connection(format!("cannot open '{}': {}", self.location, error))
            })
    }

    /// Close a connection, logging rather than failing if the close itself errors
    async fn release(&self, connection: SqliteConnection) {
        if let Err(error) = connection.close().await {
            tracing::warn!(database = %self.location, %error, "Failed to close SQLite connection");
        }
    }

    /// Read column and primary-key metadata on an open connection
    async fn read_schema(
        connection: &mut SqliteConnection,
        table: &str,
    ) -> Result<TableSchema, DatabaseError> {
        let definition: Option<Option<String>> = sqlx::query_scalar(TABLE_DEFINITION_QUERY)
            .bind(table)
            .fetch_optional(&mut *connection)
            .await
            .map_err(|error| classify_error(error, DatabaseError::Catalog))?;

        let Some(definition) = definition else {
            return Err(DatabaseError::TableNotFound(table.to_string()));
        };
        let without_rowid = definition
            .map(|sql| sql.to_ascii_uppercase().contains("WITHOUT ROWID"))
            .unwrap_or(false);

        // PRAGMA table_xinfo returns: cid, name, type, notnull, dflt_value, pk, hidden
        let pragma = format!("PRAGMA table_xinfo({})", quote_identifier(table));
        let column_rows = sqlx::query(&pragma)
            .fetch_all(&mut *connection)
            .await
            .map_err(|error| {
                classify_error(error, |message| DatabaseError::Schema {
                    table: table.to_string(),
                    message,
                })
            })?;

        let schema_error = |error: sqlx::Error| DatabaseError::Schema {
            table: table.to_string(),
            message: error.to_string(),
        };

        let mut columns = Vec::new();
        let mut primary_key_columns = Vec::new();
        let mut generated = Vec::new();

        for row in column_rows {
            let hidden: i64 = row.try_get("hidden").map_err(schema_error)?;
            if hidden == 1 {
                continue;
            }

            let name: String = row.try_get("name").map_err(schema_error)?;
            let declared_type: String = row.try_get("type").map_err(schema_error)?;
            let not_null: i64 = row.try_get("notnull").map_err(schema_error)?;
            let primary_key: i64 = row.try_get("pk").map_err(schema_error)?;

            let is_primary_key = primary_key > 0;
            if is_primary_key {
                primary_key_columns.push((primary_key, name.clone()));
            }
            generated.push(hidden == 2 || hidden == 3);

            columns.push(ColumnDefinition {
                name,
                data_type: DataType::from_declared(&declared_type),
                declared_type,
                nullable: not_null == 0,
                is_auto_generated: false,
                is_primary_key,
            });
        }

        primary_key_columns.sort_by_key(|(order, _)| *order);
        let primary_key: Vec<String> = primary_key_columns
            .into_iter()
            .map(|(_, name)| name)
            .collect();

        // A sole INTEGER primary key aliases the rowid and is assigned by SQLite
        let rowid_alias = match primary_key.as_slice() {
            [only] if !without_rowid => Some(only.clone()),
            _ => None,
        };

        for (column, is_generated) in columns.iter_mut().zip(generated) {
            let is_rowid_alias = rowid_alias.as_deref() == Some(column.name.as_str())
                && column.declared_type.eq_ignore_ascii_case("INTEGER");
            column.is_auto_generated = is_generated || is_rowid_alias;
        }

        validate_columns(table, &columns)?;

        Ok(TableSchema {
            name: table.to_string(),
            columns,
            primary_key,
        })
    }

    /// Convert a SQLite row into a name-to-value row
    fn decode_row(row: &SqliteRow) -> Result<Row, DatabaseError> {
        let mut decoded = Row::new();

        for column in row.columns() {
            let value = Self::decode_cell(row, column)?;
            decoded.insert(column.name(), value);
        }

        Ok(decoded)
    }

    /// Extract one cell, guided by the column's declared type
    fn decode_cell(row: &SqliteRow, column: &SqliteColumn) -> Result<Value, DatabaseError> {
        let index = column.ordinal();

        let raw = row
            .try_get_raw(index)
            .map_err(|error| DatabaseError::Query(error.to_string()))?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        if raw.type_info().name() == "BLOB" {
            return row
                .try_get::<Vec<u8>, _>(index)
                .map(Value::Blob)
                .map_err(|error| DatabaseError::Query(error.to_string()));
        }

        // SQLite is dynamically typed: the declared type is a hint, not a guarantee
        let preferred = match DataType::from_declared(column.type_info().name()) {
            DataType::Integer => row.try_get::<i64, _>(index).ok().map(Value::Integer),
            DataType::Real => row.try_get::<f64, _>(index).ok().map(Value::Real),
            // Only 0 and 1 read as booleans; any other integer keeps its stored value
            DataType::Boolean => row.try_get::<i64, _>(index).ok().map(|stored| match stored {
                0 => Value::Boolean(false),
                1 => Value::Boolean(true),
                other => Value::Integer(other),
            }),
            DataType::Binary => None,
            DataType::Text | DataType::Date | DataType::Other => {
                row.try_get::<String, _>(index).ok().map(Value::Text)
            }
        };
        if let Some(value) = preferred {
            return Ok(value);
        }

        // Fallback: try common types in order
        if let Ok(value) = row.try_get::<i64, _>(index) {
            return Ok(Value::Integer(value));
        }
        if let Ok(value) = row.try_get::<f64, _>(index) {
            return Ok(Value::Real(value));
        }
        if let Ok(value) = row.try_get::<String, _>(index) {
            return Ok(Value::Text(value));
        }
        if let Ok(value) = row.try_get::<bool, _>(index) {
            return Ok(Value::Boolean(value));
        }
        if let Ok(value) = row.try_get::<Vec<u8>, _>(index) {
            return Ok(Value::Blob(value));
        }

        Ok(Value::Null)
    }
}

#[async_trait]
impl DatabaseProvider for SqliteProvider {
    fn location(&self) -> &str {
        &self.location
    }

    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        let mut connection = self.connect().await?;

        let result = sqlx::query_scalar::<_, String>(LIST_TABLES_QUERY)
            .fetch_all(&mut connection)
            .await
            .map_err(|error| classify_error(error, DatabaseError::Catalog));

        self.release(connection).await;
        result
    }

    async fn get_table_schema(&self, table: &str) -> Result<TableSchema, DatabaseError> {
        let mut connection = self.connect().await?;
        let result = Self::read_schema(&mut connection, table).await;
        self.release(connection).await;
        result
    }

    async fn query(&self, statement: &Statement) -> Result<Vec<Row>, DatabaseError> {
        let mut connection = self.connect().await?;

        let result = match bind_params(sqlx::query(&statement.sql), &statement.params)
            .fetch_all(&mut connection)
            .await
        {
            Ok(rows) => rows.iter().map(Self::decode_row).collect(),
            Err(error) => Err(classify_error(error, DatabaseError::Query)),
        };

        self.release(connection).await;
        result
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, DatabaseError> {
        let mut connection = self.connect().await?;

        let result = bind_params(sqlx::query(&statement.sql), &statement.params)
            .execute(&mut connection)
            .await
            .map(|done| done.rows_affected())
            .map_err(|error| classify_error(error, DatabaseError::Constraint));

        self.release(connection).await;
        result
    }
}

/// Bind values positionally, in order
fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in params {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Boolean(value) => query.bind(*value),
            Value::Integer(value) => query.bind(*value),
            Value::Real(value) => query.bind(*value),
            Value::Text(value) => query.bind(value.clone()),
            Value::Blob(value) => query.bind(value.clone()),
        };
    }
    query
}

/// Separate connectivity failures from statement failures
///
/// Statement failures are wrapped with `otherwise`, which receives the
/// store's own message.
fn classify_error(error: sqlx::Error, otherwise: impl FnOnce(String) -> DatabaseError) -> DatabaseError {
    if is_connection_failure(&error) {
        return DatabaseError::Connection(error.to_string());
    }

    match error {
        sqlx::Error::Database(database_error) => otherwise(database_error.message().to_string()),
        other => otherwise(other.to_string()),
    }
}

fn is_connection_failure(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(database_error) => database_error
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            // BUSY, LOCKED, IOERR, CORRUPT, CANTOPEN, NOTADB
            .map(|code| matches!(code & 0xff, 5 | 6 | 10 | 11 | 14 | 26))
            .unwrap_or(false),
        _ => false,
    }
}

/// Column names must be non-empty and unique within a table
fn validate_columns(table: &str, columns: &[ColumnDefinition]) -> Result<(), DatabaseError> {
    if columns.is_empty() {
        return Err(DatabaseError::Schema {
            table: table.to_string(),
            message: "table reports no columns".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for column in columns {
        if column.name.is_empty() {
            return Err(DatabaseError::Schema {
                table: table.to_string(),
                message: "column with an empty name".to_string(),
            });
        }
        if !seen.insert(column.name.as_str()) {
            return Err(DatabaseError::Schema {
                table: table.to_string(),
                message: format!("duplicate column '{}'", column.name),
            });
        }
    }

    Ok(())
}
