//! Schema-agnostic CRUD engine
//!
//! Turns a freshly discovered [`TableSchema`] plus user-entered values into
//! parameterized statements. Column names are accepted only when the schema
//! knows them; values are always bound.
//!
//! Update and delete locate their target through a [`RowIdentity`] captured
//! when the user opened the action. The outcome of a write is reported as a
//! [`WriteOutcome`]: matching no row or several rows is a result the caller
//! branches on, not an error.

use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::schema::{
    parse_blob_literal, parse_bool, ColumnDefinition, DataType, FieldValue, FieldValueMap,
    IdentityColumn, IdentityStrategy, Row, RowIdentity, RowSet, TableSchema, Value,
};
use crate::{sql, Error, Operation, Result};
use serde::{Deserialize, Serialize};

/// Warning shown when a table has no primary key
pub const FULL_ROW_IDENTITY_WARNING: &str = "This table has no primary key. \
     The row will be matched on all of its column values, which may affect multiple rows.";

/// How many rows an update or delete actually hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStatus {
    /// The row no longer exists or its values changed since it was captured
    NoMatch,
    /// Exactly one row
    Matched,
    /// More rows than the user intended
    Ambiguous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub affected_rows: u64,
    pub status: MatchStatus,
}

impl WriteOutcome {
    pub fn from_affected_rows(affected_rows: u64) -> Self {
        let status = match affected_rows {
            0 => MatchStatus::NoMatch,
            1 => MatchStatus::Matched,
            _ => MatchStatus::Ambiguous,
        };
        Self {
            affected_rows,
            status,
        }
    }

    /// User-facing warning for the non-exact outcomes
    pub fn warning(&self) -> Option<String> {
        match self.status {
            MatchStatus::Matched => None,
            MatchStatus::NoMatch => Some(
                "No row matched. The original row may not exist anymore or its values may have changed."
                    .to_string(),
            ),
            MatchStatus::Ambiguous => Some(format!(
                "{} rows matched and were changed, not just the selected one.",
                self.affected_rows
            )),
        }
    }
}

/// Load every row of a table
///
/// The schema is rediscovered first, so an unknown table fails here
/// before any data is read.
pub async fn load_rows<DB>(database: &DB, table: &str) -> Result<RowSet>
where
    DB: DatabaseProvider + ?Sized,
{
    let schema = database.get_table_schema(table).await?;
    let rows = database.query(&sql::select_all(&schema.name)).await?;

    tracing::debug!(table = %schema.name, rows = rows.len(), "Loaded table rows");

    Ok(RowSet {
        table: schema.name.clone(),
        columns: schema.column_names(),
        rows,
    })
}

/// Capture the identity of a displayed row
///
/// With a primary key the identity is the key column(s) only; without one it
/// is every non-auto-generated column. Call this when the user opens the edit
/// or delete action, not when the statement runs.
pub fn capture_identity(schema: &TableSchema, row: &Row) -> Result<RowIdentity> {
    let (strategy, names): (IdentityStrategy, Vec<&str>) = if schema.has_primary_key() {
        (
            IdentityStrategy::PrimaryKey,
            schema.primary_key.iter().map(String::as_str).collect(),
        )
    } else {
        (
            IdentityStrategy::FullRow,
            schema
                .columns
                .iter()
                .filter(|column| !column.is_auto_generated)
                .map(|column| column.name.as_str())
                .collect(),
        )
    };

    if names.is_empty() {
        return Err(Error::EmptyIdentity(schema.name.clone()));
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let value = row.get(name).ok_or_else(|| Error::UnknownColumn {
                table: schema.name.clone(),
                column: name.to_string(),
            })?;
            Ok(IdentityColumn {
                column: name.to_string(),
                value: value.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if strategy == IdentityStrategy::FullRow {
        tracing::warn!(table = %schema.name, "No primary key; identifying row by all column values");
    }

    Ok(RowIdentity { strategy, columns })
}

/// Insert one row built from exactly the given values
pub async fn insert<DB>(database: &DB, schema: &TableSchema, values: &FieldValueMap) -> Result<()>
where
    DB: DatabaseProvider + ?Sized,
{
    let bound = bind_field_values(schema, values)?;
    let statement = sql::insert(&schema.name, &bound);

    let affected_rows = database
        .execute(&statement)
        .await
        .map_err(|source| write_error(schema, Operation::Insert, source))?;

    tracing::info!(table = %schema.name, operation = %Operation::Insert, affected_rows, "Row inserted");
    Ok(())
}

/// Update the row(s) matching `identity` with `new_values`
pub async fn update<DB>(
    database: &DB,
    schema: &TableSchema,
    identity: &RowIdentity,
    new_values: &FieldValueMap,
) -> Result<WriteOutcome>
where
    DB: DatabaseProvider + ?Sized,
{
    if new_values.is_empty() {
        return Err(Error::NothingToUpdate(schema.name.clone()));
    }

    let bound = bind_field_values(schema, new_values)?;
    let predicate = identity_predicate(schema, identity)?;
    let statement = sql::update(&schema.name, &bound, &predicate);

    let affected_rows = database
        .execute(&statement)
        .await
        .map_err(|source| write_error(schema, Operation::Update, source))?;

    Ok(report(schema, Operation::Update, affected_rows))
}

/// Delete the row(s) matching `identity`
pub async fn delete<DB>(
    database: &DB,
    schema: &TableSchema,
    identity: &RowIdentity,
) -> Result<WriteOutcome>
where
    DB: DatabaseProvider + ?Sized,
{
    let predicate = identity_predicate(schema, identity)?;
    let statement = sql::delete(&schema.name, &predicate);

    let affected_rows = database
        .execute(&statement)
        .await
        .map_err(|source| write_error(schema, Operation::Delete, source))?;

    Ok(report(schema, Operation::Delete, affected_rows))
}

fn report(schema: &TableSchema, operation: Operation, affected_rows: u64) -> WriteOutcome {
    let outcome = WriteOutcome::from_affected_rows(affected_rows);
    match outcome.status {
        MatchStatus::Matched => {
            tracing::info!(table = %schema.name, %operation, affected_rows, "Row written");
        }
        MatchStatus::NoMatch => {
            tracing::warn!(table = %schema.name, %operation, "No row matched the captured identity");
        }
        MatchStatus::Ambiguous => {
            tracing::warn!(table = %schema.name, %operation, affected_rows, "Identity matched several rows");
        }
    }
    outcome
}

fn write_error(schema: &TableSchema, operation: Operation, source: DatabaseError) -> Error {
    tracing::error!(table = %schema.name, %operation, error = %source, "Write failed");
    Error::Write {
        table: schema.name.clone(),
        operation,
        source,
    }
}

/// Resolve identity columns against the current schema
///
/// Full-row identities never search on auto-generated columns.
fn identity_predicate(schema: &TableSchema, identity: &RowIdentity) -> Result<Vec<IdentityColumn>> {
    let mut predicate = Vec::with_capacity(identity.columns.len());

    for pair in &identity.columns {
        let column = known_column(schema, &pair.column)?;
        if identity.strategy == IdentityStrategy::FullRow && column.is_auto_generated {
            continue;
        }
        predicate.push(pair.clone());
    }

    if predicate.is_empty() {
        return Err(Error::EmptyIdentity(schema.name.clone()));
    }

    Ok(predicate)
}

/// Check every key against the schema and coerce each value to its column type
fn bind_field_values(schema: &TableSchema, values: &FieldValueMap) -> Result<Vec<(String, Value)>> {
    values
        .iter()
        .map(|(name, value)| {
            let column = known_column(schema, name)?;
            if column.is_auto_generated {
                return Err(Error::AutoGeneratedColumn {
                    table: schema.name.clone(),
                    column: name.clone(),
                });
            }
            Ok((name.clone(), coerce(column, value)))
        })
        .collect()
}

fn known_column<'a>(schema: &'a TableSchema, name: &str) -> Result<&'a ColumnDefinition> {
    schema.column(name).ok_or_else(|| Error::UnknownColumn {
        table: schema.name.clone(),
        column: name.to_string(),
    })
}

/// Type coercion implied by the schema
///
/// Empty text means "not provided" and binds NULL. Binary columns read the
/// hex literal their values render as. Text that does not parse as the
/// column's type is passed through for the store to accept or reject.
fn coerce(column: &ColumnDefinition, value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Boolean(flag) => Value::Boolean(*flag),
        FieldValue::Text(text) if text.is_empty() => Value::Null,
        FieldValue::Text(text) => {
            let trimmed = text.trim();
            let parsed = match column.data_type {
                DataType::Integer => trimmed.parse::<i64>().ok().map(Value::Integer),
                DataType::Real => trimmed.parse::<f64>().ok().map(Value::Real),
                DataType::Boolean => parse_bool(trimmed).map(Value::Boolean),
                DataType::Binary => parse_blob_literal(trimmed).map(Value::Blob),
                _ => None,
            };
            parsed.unwrap_or_else(|| Value::Text(text.clone()))
        }
    }
}
