//! Database provider trait
//!
//! This trait defines the interface that all database implementations must provide.

use crate::schema::{Row, TableSchema};
use crate::sql::Statement;
use async_trait::async_trait;
use thiserror::Error;

/// Database provider trait for schema discovery and row access
///
/// Implementations open their own connection for every call and release it
/// before returning, whatever the outcome. Nothing is pooled and no
/// transaction spans two calls.
#[async_trait]
pub trait DatabaseProvider: Send + Sync + 'static {
    /// Location of the database this provider opens (a file path)
    fn location(&self) -> &str;

    /// List user table names, excluding the store's own system tables
    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError>;

    /// Discover the columns and primary key of a table without reading rows
    ///
    /// # Arguments
    ///
    /// * `table` - Name of the table
    async fn get_table_schema(&self, table: &str) -> Result<TableSchema, DatabaseError>;

    /// Run a parameterized read
    ///
    /// # Arguments
    ///
    /// * `statement` - SQL text with `?` placeholders and the values to bind
    async fn query(&self, statement: &Statement) -> Result<Vec<Row>, DatabaseError>;

    /// Run a parameterized write and return the number of rows it changed
    ///
    /// Zero changed rows is not an error.
    async fn execute(&self, statement: &Statement) -> Result<u64, DatabaseError>;
}

/// Database error type
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The database could not be opened or stopped responding
    #[error("Connection error: {0}")]
    Connection(String),

    /// Table metadata could not be read
    #[error("Cannot read table catalog: {0}")]
    Catalog(String),

    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Column metadata was unreadable or violated its invariants
    #[error("Schema error in table '{table}': {message}")]
    Schema { table: String, message: String },

    /// The store rejected a write
    #[error("Rejected by the database: {0}")]
    Constraint(String),

    /// Generic read failure
    #[error("Query failed: {0}")]
    Query(String),
}

impl DatabaseError {
    pub fn kind(&self) -> &'static str {
        match self {
            DatabaseError::Connection(_) => "connection",
            DatabaseError::Catalog(_) => "catalog",
            DatabaseError::TableNotFound(_) => "unknown-table",
            DatabaseError::Schema { .. } => "schema",
            DatabaseError::Constraint(_) => "constraint",
            DatabaseError::Query(_) => "query",
        }
    }
}
